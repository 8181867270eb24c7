use crate::alphabet::AlphabetSpec;
use crate::error::{PwdbError, Result};
use crate::verifier::Fingerprint;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const FIELD_DELIMITER: char = ' ';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub name: String,
    pub spec: AlphabetSpec,
}

impl SiteRecord {
    fn to_line(&self) -> String {
        format!("{}{}{}\n", self.name, FIELD_DELIMITER, self.spec)
    }
}

pub fn validate_site_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(PwdbError::InvalidSiteName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    fingerprint: Fingerprint,
    records: Vec<SiteRecord>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn create(path: impl AsRef<Path>, fingerprint: Fingerprint) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| PwdbError::io(&path, "Failed to create parent directory", e))?;
        }

        let mut file =
            File::create(&path).map_err(|e| PwdbError::io(&path, "Failed to create", e))?;
        writeln!(file, "{}", fingerprint.to_hex())
            .and_then(|_| file.sync_all())
            .map_err(|e| PwdbError::io(&path, "Failed to write fingerprint", e))?;

        tracing::info!(path = %path.display(), "Created registry");

        Ok(Self {
            path,
            fingerprint,
            records: Vec::new(),
            index: HashMap::new(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PwdbError::unavailable(&path, "file does not exist"),
            _ => PwdbError::io(&path, "Failed to open", e),
        })?;

        let mut lines = BufReader::new(file).lines();

        let fingerprint = match lines.next() {
            Some(line) => {
                let line = line.map_err(|e| PwdbError::io(&path, "Failed to read", e))?;
                Fingerprint::from_hex(line.trim())
                    .ok_or_else(|| PwdbError::corrupt(1, "invalid master fingerprint"))?
            }
            None => return Err(PwdbError::corrupt(1, "missing master fingerprint")),
        };

        let mut registry = Self {
            path,
            fingerprint,
            records: Vec::new(),
            index: HashMap::new(),
        };

        for (i, line) in lines.enumerate() {
            let line_no = i + 2;
            let line = line.map_err(|e| PwdbError::io(&registry.path, "Failed to read", e))?;
            let record = parse_record(line_no, &line)?;

            if registry.index.contains_key(&record.name) {
                return Err(PwdbError::corrupt(
                    line_no,
                    format!("site \"{}\" appears more than once", record.name),
                ));
            }
            registry.insert(record);
        }

        tracing::debug!(
            path = %registry.path.display(),
            sites = registry.len(),
            "Loaded registry"
        );

        Ok(registry)
    }

    pub fn register(&mut self, name: &str, spec: AlphabetSpec) -> Result<&SiteRecord> {
        validate_site_name(name)?;

        if self.index.contains_key(name) {
            return Err(PwdbError::DuplicateSite(name.to_string()));
        }

        let record = SiteRecord {
            name: name.to_string(),
            spec,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    PwdbError::unavailable(&self.path, "file does not exist")
                }
                _ => PwdbError::io(&self.path, "Failed to open for append", e),
            })?;

        let mut line = record.to_line();
        if !ends_with_newline(&mut file)
            .map_err(|e| PwdbError::io(&self.path, "Failed to read", e))?
        {
            // Previous line left unterminated.
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|e| PwdbError::io(&self.path, "Failed to append record", e))?;

        tracing::info!(site = %record.name, spec = %record.spec, "Registered site");

        let idx = self.insert(record);
        Ok(&self.records[idx])
    }

    pub fn lookup(&self, name: &str) -> Option<&AlphabetSpec> {
        self.index.get(name).map(|&idx| &self.records[idx].spec)
    }

    pub fn search<'a>(&'a self, fragment: &'a str) -> impl Iterator<Item = &'a SiteRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.name.contains(fragment))
    }

    pub fn records(&self) -> &[SiteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn insert(&mut self, record: SiteRecord) -> usize {
        let idx = self.records.len();
        self.index.insert(record.name.clone(), idx);
        self.records.push(record);
        idx
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn parse_record(line_no: usize, line: &str) -> Result<SiteRecord> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    let [name, spec] = fields.as_slice() else {
        return Err(PwdbError::corrupt(
            line_no,
            format!("expected 2 fields, found {}", fields.len()),
        ));
    };

    validate_site_name(name).map_err(|_| PwdbError::corrupt(line_no, "invalid site name"))?;
    let spec = AlphabetSpec::parse(spec)
        .map_err(|e| PwdbError::corrupt(line_no, e.to_string()))?;

    Ok(SiteRecord {
        name: name.to_string(),
        spec,
    })
}
