use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A throwaway document root under the system temp dir, removed on drop.
pub struct DocRoot {
    path: PathBuf,
}

impl DocRoot {
    pub fn new() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        let path = std::env::temp_dir().join(format!(
            "fileserve-test-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(path.join("www")).unwrap();

        Self { path }
    }

    /// The served directory. Its parent holds files that must stay unreachable.
    pub fn root(&self) -> PathBuf {
        self.path.join("www")
    }

    pub fn file(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }

    #[allow(dead_code)] // not every test binary needs directories
    pub fn dir(&self, rel: &str) -> &Self {
        std::fs::create_dir_all(self.root().join(rel)).unwrap();
        self
    }

    /// Writes a file next to (outside of) the document root.
    #[allow(dead_code)]
    pub fn outside(&self, name: &str, contents: impl AsRef<[u8]>) -> &Self {
        std::fs::write(self.path.join(name), contents).unwrap();
        self
    }
}

impl Drop for DocRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// A response read back off the wire.
#[allow(dead_code)] // unused by the resolver tests
#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl RawResponse {
    pub fn parse(raw: &[u8]) -> Self {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has no header terminator");
        let head = std::str::from_utf8(&raw[..split]).unwrap();
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap().to_string();
        let headers = lines
            .map(|l| {
                let (k, v) = l.split_once(": ").unwrap();
                (k.to_string(), v.to_string())
            })
            .collect();

        Self {
            status_line,
            headers,
            body: raw[split + 4..].to_vec(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
