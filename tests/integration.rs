use std::fs;

use minidb::shell::Shell;
use minidb::{Config, Database, DbError, ErrorCategory};
use tempfile::TempDir;

fn open_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&Config::new(dir.path())).unwrap();
    (dir, db)
}

fn reopen(dir: &TempDir) -> Database {
    Database::open(&Config::new(dir.path())).unwrap()
}

fn seed_school(db: &mut Database) {
    db.execute("CREATE TABLE students (id INT, name VARCHAR(20), age INT)").unwrap();
    db.execute("CREATE TABLE grades (student_id INT, course VARCHAR(10), score INT)").unwrap();
    db.execute("INSERT INTO students VALUES (1, 'Alice', 20)").unwrap();
    db.execute("INSERT INTO students VALUES (2, 'Bob', 22)").unwrap();
    db.execute("INSERT INTO students VALUES (3, 'Carol', 21)").unwrap();
    db.execute("INSERT INTO grades VALUES (1, 'math', 90)").unwrap();
    db.execute("INSERT INTO grades VALUES (1, 'art', 75)").unwrap();
    db.execute("INSERT INTO grades VALUES (3, 'math', 60)").unwrap();
}

#[test]
fn create_writes_catalog_and_table_file() {
    let (dir, mut db) = open_db();
    let msg = db.execute("CREATE TABLE students (id INT, name VARCHAR(20));").unwrap();
    assert_eq!(msg, "OK: Table created: students");

    let catalog = fs::read_to_string(dir.path().join("catalog.meta")).unwrap();
    assert_eq!(catalog.trim_end(), "students|id:INT:4,name:VARCHAR:20");

    let csv = fs::read_to_string(dir.path().join("students.csv")).unwrap();
    assert_eq!(csv, "id,name\n");
}

#[test]
fn rows_survive_reopen() {
    let (dir, mut db) = open_db();
    seed_school(&mut db);
    drop(db);

    let db = reopen(&dir);
    assert_eq!(db.table_names(), vec!["grades", "students"]);
    let result = db.query("SELECT name FROM students WHERE age > 20").unwrap();
    assert_eq!(result.headers, vec!["name"]);
    assert_eq!(
        result.rows,
        vec![vec!["Bob".to_string()], vec!["Carol".to_string()]]
    );
}

#[test]
fn strings_with_commas_and_quotes_round_trip_through_csv() {
    let (dir, mut db) = open_db();
    db.execute("CREATE TABLE notes (id INT, body VARCHAR)").unwrap();
    db.execute("INSERT INTO notes VALUES (1, 'a, \"quoted\" note')").unwrap();
    drop(db);

    let db = reopen(&dir);
    let result = db.query("SELECT body FROM notes").unwrap();
    assert_eq!(result.rows, vec![vec!["a, \"quoted\" note".to_string()]]);
}

#[test]
fn inner_join_with_aliases() {
    let (_dir, mut db) = open_db();
    seed_school(&mut db);

    let result = db
        .query(
            "SELECT s.name, g.course, g.score FROM students s \
             JOIN grades AS g ON s.id = g.student_id WHERE g.score >= 75",
        )
        .unwrap();
    assert_eq!(result.headers, vec!["s.name", "g.course", "g.score"]);
    assert_eq!(
        result.rows,
        vec![
            vec!["Alice".to_string(), "math".to_string(), "90".to_string()],
            vec!["Alice".to_string(), "art".to_string(), "75".to_string()],
        ]
    );
}

#[test]
fn update_and_delete_rewrite_table_file() {
    let (dir, mut db) = open_db();
    seed_school(&mut db);

    assert_eq!(
        db.execute("UPDATE students SET age = 30 WHERE name = 'Bob'").unwrap(),
        "OK: 1 row(s) updated in students"
    );
    assert_eq!(
        db.execute("DELETE FROM students WHERE id <> 2").unwrap(),
        "OK: 2 row(s) deleted from students"
    );

    let csv = fs::read_to_string(dir.path().join("students.csv")).unwrap();
    assert_eq!(csv, "id,name,age\n2,Bob,30\n");
}

#[test]
fn alter_table_is_persisted() {
    let (dir, mut db) = open_db();
    seed_school(&mut db);

    db.execute("ALTER TABLE students ADD COLUMN email VARCHAR(30)").unwrap();
    db.execute("ALTER TABLE students DROP COLUMN age").unwrap();
    db.execute("ALTER TABLE grades RENAME TO marks").unwrap();
    drop(db);

    assert!(!dir.path().join("grades.csv").exists());
    assert!(dir.path().join("marks.csv").exists());

    let db = reopen(&dir);
    assert_eq!(db.table_names(), vec!["marks", "students"]);
    let result = db.query("SELECT * FROM students WHERE id = 1").unwrap();
    assert_eq!(
        result.headers,
        vec!["students.id", "students.name", "students.email"]
    );
    assert_eq!(
        result.rows,
        vec![vec!["1".to_string(), "Alice".to_string(), String::new()]]
    );
}

#[test]
fn drop_table_removes_files_and_catalog_entry() {
    let (dir, mut db) = open_db();
    seed_school(&mut db);
    db.execute("DROP TABLE grades").unwrap();
    assert!(!dir.path().join("grades.csv").exists());

    let catalog = fs::read_to_string(dir.path().join("catalog.meta")).unwrap();
    assert!(!catalog.contains("grades"));

    let err = db.execute("SELECT * FROM grades").unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
}

#[test]
fn errors_leave_data_untouched() {
    let (dir, mut db) = open_db();
    seed_school(&mut db);
    let before = fs::read_to_string(dir.path().join("students.csv")).unwrap();

    let err = db.execute("INSERT INTO students VALUES (4, 'Dave')").unwrap_err();
    assert!(matches!(err, DbError::ValueCount { expected: 3, actual: 2, .. }));
    let err = db.execute("UPDATE students SET age = 'old'").unwrap_err();
    assert!(matches!(err, DbError::TypeMismatch { .. }));
    let err = db.execute("SELEC * FROM students").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);

    let after = fs::read_to_string(dir.path().join("students.csv")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn corrupt_catalog_is_reported_on_open() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("catalog.meta"), "broken line without separator\n").unwrap();
    let err = Database::open(&Config::new(dir.path())).err().unwrap();
    assert!(matches!(err, DbError::CorruptCatalog(_)));
}

#[test]
fn script_runs_against_data_directory() {
    let (dir, db) = open_db();
    let script = "\
-- set up
CREATE TABLE t (id INT, label VARCHAR(5));
INSERT INTO t VALUES (1, 'one');
INSERT INTO t VALUES (2, 'toolong');
SELECT * FROM t;
";
    let mut shell = Shell::new(db);
    let mut out = Vec::new();
    let summary = shell.run_script(script.as_bytes(), &mut out).unwrap();
    assert_eq!(summary.executed, 4);
    assert_eq!(summary.failed, 1);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Error: value for column label exceeds maximum length 5"));
    assert!(text.contains("(1 row)"));

    let csv = fs::read_to_string(dir.path().join("t.csv")).unwrap();
    assert_eq!(csv, "id,label\n1,one\n");
}
