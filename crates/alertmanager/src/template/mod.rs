mod file;

use std::collections::BTreeMap;
use std::sync::Arc;

use promcfg_common::{Error, FileLocker, FsClient};

pub use file::{parse_templates, render, validate_body};

pub const TEMPLATE_FILE_POSTFIX: &str = ".tmpl";

fn add_postfix(filename: &str) -> String {
    format!("{filename}{TEMPLATE_FILE_POSTFIX}")
}

pub struct TemplateClient {
    fs: Arc<dyn FsClient>,
    locks: Arc<FileLocker>,
}

impl TemplateClient {
    pub fn new(fs: Arc<dyn FsClient>, locks: Arc<FileLocker>) -> Self {
        Self { fs, locks }
    }

    pub fn root(&self) -> &str {
        self.fs.root()
    }

    pub fn get_template_file(&self, filename: &str) -> Result<String, Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.read();
        self.read_raw(filename)
    }

    pub fn create_template_file(&self, filename: &str, text: &str) -> Result<(), Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.write();
        self.write_raw(filename, text)
    }

    pub fn edit_template_file(&self, filename: &str, text: &str) -> Result<(), Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.write();
        self.write_raw(filename, text)
    }

    pub fn delete_template_file(&self, filename: &str) -> Result<(), Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.write();
        self.fs
            .delete_file(&add_postfix(filename))
            .map_err(|e| Error::Io(format!("error deleting template file: {e}")))
    }

    pub fn get_templates(&self, filename: &str) -> Result<BTreeMap<String, String>, Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.read();
        self.read_parsed(filename)
    }

    pub fn get_template(&self, filename: &str, tmpl_name: &str) -> Result<String, Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.read();
        let templates = self.read_parsed(filename)?;
        templates
            .get(tmpl_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("template {tmpl_name} not found")))
    }

    pub fn add_template(&self, filename: &str, tmpl_name: &str, body: &str) -> Result<(), Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.write();
        let mut templates = self.read_parsed(filename)?;

        if templates.contains_key(tmpl_name) {
            return Err(Error::Conflict(format!(
                "template {tmpl_name} already exists"
            )));
        }
        validate_body(body)?;

        templates.insert(tmpl_name.to_string(), body.to_string());
        self.write_raw(filename, &render(&templates))
    }

    pub fn edit_template(&self, filename: &str, tmpl_name: &str, body: &str) -> Result<(), Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.write();
        let mut templates = self.read_parsed(filename)?;

        if !templates.contains_key(tmpl_name) {
            return Err(Error::NotFound(format!(
                "template {tmpl_name} does not exist"
            )));
        }
        validate_body(body).map_err(|e| Error::Parse(format!("error adding template: {e}")))?;

        templates.insert(tmpl_name.to_string(), body.to_string());
        self.write_raw(filename, &render(&templates))
    }

    pub fn delete_template(&self, filename: &str, tmpl_name: &str) -> Result<(), Error> {
        let lock = self.locks.for_file(filename);
        let _guard = lock.write();
        let mut templates = self.read_parsed(filename)?;

        if templates.remove(tmpl_name).is_none() {
            return Err(Error::NotFound(format!(
                "template {tmpl_name} does not exist"
            )));
        }
        self.write_raw(filename, &render(&templates))
    }

    fn read_raw(&self, filename: &str) -> Result<String, Error> {
        let bytes = self
            .fs
            .read_file(&add_postfix(filename))
            .map_err(|e| Error::Io(format!("error reading template file: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Io(format!("error reading template file: {e}")))
    }

    fn read_parsed(&self, filename: &str) -> Result<BTreeMap<String, String>, Error> {
        parse_templates(&self.read_raw(filename)?)
    }

    fn write_raw(&self, filename: &str, text: &str) -> Result<(), Error> {
        self.fs
            .write_file(&add_postfix(filename), text.as_bytes(), 0o660)
            .map_err(|e| Error::Io(format!("error writing template file: {e}")))
    }
}
