use criterion::{criterion_group, criterion_main, Criterion};
use minidb::{Config, Database};
use tempfile::TempDir;

fn populate(db: &mut Database, rows: usize) {
    db.execute("CREATE TABLE t (id INT, name VARCHAR(32), value INT)").unwrap();
    for i in 0..rows {
        db.execute(&format!("INSERT INTO t VALUES ({i}, 'name_{i}', {})", i % 100))
            .unwrap();
    }
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_1000_rows_csv", |b| {
        b.iter(|| {
            let dir = TempDir::new().unwrap();
            let mut db = Database::open(&Config::new(dir.path())).unwrap();
            populate(&mut db, 1000);
        });
    });

    c.bench_function("insert_1000_rows_memory", |b| {
        b.iter(|| {
            let mut db = Database::in_memory();
            populate(&mut db, 1000);
        });
    });
}

fn bench_select(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let mut db = Database::open(&Config::new(dir.path())).unwrap();
    populate(&mut db, 1000);

    c.bench_function("select_all_1000_rows", |b| {
        b.iter(|| {
            let result = db.query("SELECT * FROM t").unwrap();
            assert_eq!(result.row_count(), 1000);
        });
    });

    c.bench_function("select_where_1000_rows", |b| {
        b.iter(|| {
            let result = db.query("SELECT name FROM t WHERE value < 10").unwrap();
            assert_eq!(result.row_count(), 100);
        });
    });
}

fn bench_join(c: &mut Criterion) {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE a (id INT, label VARCHAR(16))").unwrap();
    db.execute("CREATE TABLE b (a_id INT, score INT)").unwrap();
    for i in 0..100 {
        db.execute(&format!("INSERT INTO a VALUES ({i}, 'a{i}')")).unwrap();
        db.execute(&format!("INSERT INTO b VALUES ({i}, {})", i * 2)).unwrap();
    }

    c.bench_function("nested_loop_join_100x100", |b| {
        b.iter(|| {
            let result = db
                .query("SELECT a.label, b.score FROM a JOIN b ON a.id = b.a_id")
                .unwrap();
            assert_eq!(result.row_count(), 100);
        });
    });
}

criterion_group!(benches, bench_insert, bench_select, bench_join);
criterion_main!(benches);
