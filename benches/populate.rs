use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mwx_convert::data::columnar_table::ColumnarTable;
use mwx_convert::data::populator::ColumnarPopulator;
use mwx_convert::data::record::Record;
use mwx_convert::data::type_inference::TypeInference;
use mwx_convert::source::xml_records::PayloadReader;

fn create_payload(rows: usize) -> String {
    let mut xml = String::from("<GpsResults>\n");
    for i in 0..rows {
        let status = if i % 7 == 0 { "" } else { r#" status="Locked""# };
        xml.push_str(&format!(
            r#"  <Row DataSrvTime="2024-05-01T11:{:02}:{:02}.250" Lat="{}" Lon="{}" Alt="{}"{}/>"#,
            (i / 60) % 60,
            i % 60,
            61.1 + i as f64 * 1e-5,
            24.8 - i as f64 * 2e-5,
            120.0 + i as f64 * 4.5,
            status
        ));
        xml.push('\n');
    }
    xml.push_str("</GpsResults>\n");
    xml
}

fn create_records(rows: usize) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            Record::new("Row")
                .with_attribute("DataSrvTime", "2024-05-01T11:00:00.250")
                .with_attribute("Alt", format!("{}", 120.0 + i as f64))
                .with_attribute("Status", "Locked")
        })
        .collect()
}

fn benchmark_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");

    for size in [1_000, 10_000] {
        let records = create_records(size);
        let schema = TypeInference::infer_schema(&records[0].attributes);
        let populator = ColumnarPopulator::default();

        group.bench_with_input(BenchmarkId::new("records", size), &records, |b, records| {
            b.iter(|| {
                let mut table = ColumnarTable::from_schema("GpsResults", &schema);
                let rows = populator
                    .populate(&mut table, &schema, records.iter().cloned().map(Ok))
                    .unwrap();
                black_box(rows)
            })
        });
    }

    group.finish();
}

fn benchmark_read_and_populate(c: &mut Criterion) {
    let payload = create_payload(10_000);

    c.bench_function("read_and_populate_10k", |b| {
        b.iter(|| {
            let mut reader = PayloadReader::open("GpsResults", payload.as_bytes()).unwrap();
            let first = reader.next().unwrap().unwrap();
            let schema = TypeInference::infer_schema(&first.attributes);
            let mut table = ColumnarTable::from_schema(reader.root_name(), &schema);
            let records = std::iter::once(Ok(first)).chain(reader);
            ColumnarPopulator::default()
                .populate(&mut table, &schema, records)
                .unwrap();
            black_box(table.row_count())
        })
    });
}

criterion_group!(benches, benchmark_populate, benchmark_read_and_populate);
criterion_main!(benches);
