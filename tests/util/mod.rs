use std::path::{Path, PathBuf};

use mbsearch::indexer::load::load_generation;
use mbsearch::model::EntityType;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_target(true)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

#[allow(dead_code)]
struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[allow(dead_code)]
pub const NIRVANA_ID: &str = "5b11f4ce-a62d-471e-81fc-a69a8278c7da";
#[allow(dead_code)]
pub const NEVERMIND_ID: &str = "1b022e01-4da6-387b-8658-8678046e4cef";
#[allow(dead_code)]
pub const LITHIUM_ID: &str = "8f4d0a4e-2a1b-4b8a-9c5e-3d1f4c2b6a71";

const ARTISTS: &str = r#"{"arid":"5b11f4ce-a62d-471e-81fc-a69a8278c7da","artist":"Nirvana","sortname":"Nirvana","type":"group","begin":"1987","end":"1994","comment":"90s US grunge band"}
{"arid":"ea42a36e-4aa9-4b4b-a6b7-9c3b5a7c1a2b","artist":"R.E.M.","sortname":"R.E.M.","type":"group","begin":"1980","end":"2011"}
{"arid":"9fdaa16b-a6c4-4831-b87c-bc9ca8ce7eaa","artist":"Beyoncé","sortname":"Beyoncé","type":"person","begin":"1981"}
{"arid":"0e9e7a4b-1b2c-4d3e-8f90-a1b2c3d4e5f6","artist":"Nirvana (UK)","sortname":"Nirvana","type":"group","comment":"60s band from London"}
{"arid":"b3c1e2d4-5a6f-4b7c-8d9e-0f1a2b3c4d5e","artist":"Guns N' Roses","sortname":"Guns N' Roses","type":"group"}
{"arid":"c4d5e6f7-0a1b-4c2d-9e3f-4a5b6c7d8e9f","artist":"<script>alert(1)</script>","type":"person"}
{"arid":"d1e2f3a4-b5c6-4d7e-8f90-1a2b3c4d5e6f","artist":"坂本龍一","sortname":"Sakamoto, Ryuichi","type":"person"}
"#;

const RELEASES: &str = r#"{"reid":"1b022e01-4da6-387b-8658-8678046e4cef","release":"Nevermind","arid":"5b11f4ce-a62d-471e-81fc-a69a8278c7da","artist":"Nirvana","type":"album","status":"official","tracks":"13","date":"1991-09-24","country":"US","lang":"eng","script":"Latn","barcode":"720642442524"}
{"reid":"2c133f12-5eb7-498c-9769-9789157f5df0","release":"Automatic for the People","arid":"ea42a36e-4aa9-4b4b-a6b7-9c3b5a7c1a2b","artist":"R.E.M.","type":"album","status":"official","tracks":"12"}
{"reid":"3d244023-6fc8-4a9d-a87a-a89a268a6e01","release":"Lithium","arid":"5b11f4ce-a62d-471e-81fc-a69a8278c7da","artist":"Nirvana","type":"single","status":"promotion","tracks":"3","barcode":"0012345"}
"#;

const TRACKS: &str = r#"{"trid":"8f4d0a4e-2a1b-4b8a-9c5e-3d1f4c2b6a71","track":"Lithium","arid":"5b11f4ce-a62d-471e-81fc-a69a8278c7da","artist":"Nirvana","reid":"1b022e01-4da6-387b-8658-8678046e4cef","release":"Nevermind","tnum":"5","tracks":"13","dur":"257000","type":"album"}
{"trid":"9a5e1b5f-3b2c-4c9b-ad6f-4e2a5d3c7b82","track":"Come as You Are","arid":"5b11f4ce-a62d-471e-81fc-a69a8278c7da","artist":"Nirvana","reid":"1b022e01-4da6-387b-8658-8678046e4cef","release":"Nevermind","tnum":"3","tracks":"13","dur":"219000","type":"album"}
"#;

const LABELS: &str = r#"{"laid":"4a6b2c1d-7e8f-4a9b-8c0d-1e2f3a4b5c6d","label":"Sub Pop","sortname":"Sub Pop","type":"original production","code":"1234","begin":"1986"}
{"laid":"5b7c3d2e-8f9a-4b0c-9d1e-2f3a4b5c6d7e","label":"DGC Records","type":"original production"}
"#;

/// Writes `<entity>.jsonl` exports for artist, release, track and label.
pub fn write_exports(dir: &Path) {
    std::fs::create_dir_all(dir).expect("create export dir");
    for (entity, body) in [
        ("artist", ARTISTS),
        ("release", RELEASES),
        ("track", TRACKS),
        ("label", LABELS),
    ] {
        std::fs::write(dir.join(format!("{entity}.jsonl")), body).expect("write export");
    }
}

/// A published generation built from the fixture exports.
#[allow(dead_code)]
pub struct FixtureCatalog {
    pub dir: TempDir,
    pub indexes_root: PathBuf,
    pub label: String,
    pub generation: PathBuf,
}

#[allow(dead_code)]
impl FixtureCatalog {
    pub const ENTITIES: [EntityType; 4] = [
        EntityType::Artist,
        EntityType::Release,
        EntityType::Track,
        EntityType::Label,
    ];

    pub fn build() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let exports = dir.path().join("exports");
        write_exports(&exports);
        let indexes_root = dir.path().join("indexes");
        let label = "catalog".to_string();
        let generation = indexes_root.join(&label).join("1700000000");
        load_generation(&exports, &generation, &Self::ENTITIES).expect("load fixture generation");
        Self {
            dir,
            indexes_root,
            label,
            generation,
        }
    }
}
