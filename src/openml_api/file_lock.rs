use std::fs::File;
use std::io::{self, Read, Write};

use fs2::FileExt;

/// Advisory lock held on a cache file until dropped. Readers share, writers are exclusive.
pub struct CacheLock {
    file: File,
}

impl CacheLock {
    pub fn shared(file: File) -> io::Result<Self> {
        file.lock_shared()?;
        Ok(CacheLock { file })
    }

    pub fn exclusive(file: File) -> io::Result<Self> {
        file.lock_exclusive()?;
        Ok(CacheLock { file })
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Failed to release cache lock: {}", e);
        }
    }
}

impl Read for CacheLock {
    #[inline(always)]
    fn read(&mut self, data: &mut [u8]) -> io::Result<usize> {
        self.file.read(data)
    }
}

impl Write for CacheLock {
    #[inline(always)]
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data)
    }

    #[inline(always)]
    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[test]
fn write_then_read_under_lock() {
    use std::env;
    use std::fs::{self, OpenOptions};

    let path = env::temp_dir().join(format!("claimfreq-lock-{}", ::std::process::id()));

    {
        let f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .unwrap();
        let mut w = CacheLock::exclusive(f).unwrap();
        w.write_all(b"@RELATION test").unwrap();
    }

    let mut data = String::new();
    {
        let mut r = CacheLock::shared(File::open(&path).unwrap()).unwrap();
        r.read_to_string(&mut data).unwrap();
    }
    let _ = fs::remove_file(&path);

    assert_eq!(data, "@RELATION test");
}
