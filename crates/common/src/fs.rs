use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

pub trait FsClient: Send + Sync {
    fn read_file(&self, name: &str) -> io::Result<Vec<u8>>;
    fn write_file(&self, name: &str, data: &[u8], mode: u32) -> io::Result<()>;
    fn delete_file(&self, name: &str) -> io::Result<()>;
    fn stat(&self, name: &str) -> io::Result<fs::Metadata>;
    fn root(&self) -> &str;
}

pub struct DiskClient {
    root: String,
}

impl DiskClient {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn join(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.root, name))
    }
}

impl FsClient for DiskClient {
    fn read_file(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.join(name))
    }

    fn write_file(&self, name: &str, data: &[u8], mode: u32) -> io::Result<()> {
        let path = self.join(name);
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        let tmp = dir.join(format!(
            ".{}.tmp",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "write".into())
        ));
        fs::write(&tmp, data)?;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(mode))?;
        // rename keeps replacement atomic for any concurrent reader
        fs::rename(&tmp, &path)
    }

    fn delete_file(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.join(name))
    }

    fn stat(&self, name: &str) -> io::Result<fs::Metadata> {
        fs::metadata(self.join(name))
    }

    fn root(&self) -> &str {
        &self.root
    }
}
