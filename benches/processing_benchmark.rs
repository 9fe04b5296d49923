use cattle_climate::models::{ParsedSeries, SeriesProvenance, StationFileKey, TimeSeriesRecord};
use cattle_climate::processors::{
    DateRange, DateRangeFilter, TemporalAggregator, ThermalIndexCalculator,
};
use cattle_climate::readers::{parse_data_line, ReferenceReader, SeriesReader};
use cattle_climate::utils::coordinates::parse_coordinate;
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

// Hourly readings starting 2020-01-01
fn create_test_series(tag: &str, hours: usize, base: f64) -> ParsedSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let records: Vec<TimeSeriesRecord> = (0..hours)
        .map(|h| {
            let value = base + ((h % 24) as f64 - 12.0) * 0.5;
            TimeSeriesRecord::new(start + Duration::hours(h as i64), value)
        })
        .collect();

    ParsedSeries {
        header: format!("{}@1", tag),
        provenance: SeriesProvenance {
            source_file: format!("{}@1.data", tag),
            variable_tag: tag.to_string(),
            station_code: 1,
            total_lines: records.len(),
            valid_lines: records.len(),
        },
        records,
        line_errors: Vec::new(),
    }
}

fn create_test_text(hours: usize) -> String {
    let series = create_test_series("TBS", hours, 28.0);
    let mut text = String::from("TBS@1\n");
    for (i, record) in series.records.iter().enumerate() {
        if i % 100 == 0 {
            text.push_str("corrupt line\n");
        }
        text.push_str(&format!(
            "{}|{}\n",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.value
        ));
    }
    text
}

fn benchmark_line_parsing(c: &mut Criterion) {
    let lines = [
        "2020-03-01 07:00:00|27.4",
        "2020-03-01 08:00:00|-3.25",
        "2020-03-01 09:00:00|abc",
        "2020-03-01|27.4",
    ];

    c.bench_function("parse_data_line", |b| {
        b.iter(|| {
            let valid = lines
                .iter()
                .filter(|line| parse_data_line(black_box(line)).is_ok())
                .count();
            black_box(valid)
        })
    });
}

fn benchmark_series_parsing(c: &mut Criterion) {
    let text = create_test_text(24 * 365);
    let key = StationFileKey::new("TBS", 1);
    let reader = SeriesReader::new();

    c.bench_function("parse_series_year_hourly", |b| {
        b.iter(|| {
            let series = reader.parse_text("TBS@1.data", &key, black_box(&text));
            black_box(series.len())
        })
    });
}

fn benchmark_thermal_indices(c: &mut Criterion) {
    let mut group = c.benchmark_group("thermal_indices_by_hours");

    for &hours in &[24 * 30, 24 * 365, 24 * 365 * 5] {
        group.bench_with_input(BenchmarkId::new("hours", hours), &hours, |b, &hours| {
            let tbs = create_test_series("TBS", hours, 28.0);
            let tbh = create_test_series("TBH", hours, 23.0);
            let tr = create_test_series("TR", hours, 21.0);
            let vv = create_test_series("VV", hours, 3.0);
            let calculator = ThermalIndexCalculator::new();

            b.iter(|| {
                let table = calculator.compute(&tbs, &tbh, &tr, &vv);
                black_box(table.map(|t| t.len()).unwrap_or(0))
            })
        });
    }

    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let series = create_test_series("TBS", 24 * 365 * 5, 28.0);
    let points: Vec<_> = series.records.iter().map(|r| (r.timestamp, r.value)).collect();

    c.bench_function("monthly_and_annual_means", |b| {
        b.iter(|| {
            let means = TemporalAggregator::new().aggregate(black_box(points.iter().copied()));
            black_box(means.monthly.len() + means.annual.len())
        })
    });
}

fn benchmark_date_filter(c: &mut Criterion) {
    let series = create_test_series("TBS", 24 * 365 * 5, 28.0);
    let filter = DateRangeFilter::new(DateRange::between(
        NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 3, 31).unwrap(),
    ));

    c.bench_function("date_range_filter", |b| {
        b.iter(|| black_box(filter.apply(black_box(&series.records)).len()))
    });
}

// Registry rows as exported from the spreadsheet: decimal coordinates, some
// with a comma separator, some cells left empty.
fn create_station_registry(stations: usize) -> String {
    let mut text = String::from(
        "CODIGO,nombre,CATEGORIA,DEPARTAMENTO,MUNICIPIO,latitud,longitud,altitud\n",
    );
    for i in 0..stations {
        let latitude = 4.0 + (i % 70) as f64 * 0.1;
        let longitude = -76.0 + (i % 40) as f64 * 0.1;
        let (lat, lon) = match i % 3 {
            0 => (format!("{:.4}", latitude), format!("{:.4}", longitude)),
            1 => (
                format!("\"{:.4}\"", latitude).replace('.', ","),
                format!("\"{:.4}\"", longitude).replace('.', ","),
            ),
            _ => (String::new(), String::new()),
        };
        text.push_str(&format!(
            "{},ESTACION {},Climatica Principal,CESAR,VALLEDUPAR,{},{},{}\n",
            15015000 + i,
            i,
            lat,
            lon,
            100 + i % 900
        ));
    }
    text
}

fn benchmark_coordinate_parsing(c: &mut Criterion) {
    let coordinates = ["10.4350", "-73.2494", "10,4350", "-73,2494", "4.5986", "-74.0758"];

    c.bench_function("decimal_coordinate_parsing", |b| {
        b.iter(|| {
            let parsed = coordinates
                .iter()
                .filter_map(|c| parse_coordinate(black_box(c)).ok())
                .count();
            black_box(parsed)
        })
    });
}

fn benchmark_station_registry_load(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stations.csv");
    std::fs::write(&path, create_station_registry(2_000)).unwrap();
    let reader = ReferenceReader::new();

    c.bench_function("station_registry_load", |b| {
        b.iter(|| black_box(reader.read_stations(black_box(&path)).map(|s| s.len()).unwrap_or(0)))
    });
}

criterion_group!(
    benches,
    benchmark_line_parsing,
    benchmark_series_parsing,
    benchmark_thermal_indices,
    benchmark_aggregation,
    benchmark_date_filter,
    benchmark_coordinate_parsing,
    benchmark_station_registry_load
);
criterion_main!(benches);
