use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, StdoutLock, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use oxo_search::PerfectPlayTable;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::schema::q_model::QModel;

/// Destination of a JSON result: a file, or stdout when no path is given.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutLock<'static>),
    File(BufWriter<File>, PathBuf),
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = match output_path {
            Some(path) => Output::create(path)?,
            None => Output::Stdout(io::stdout().lock()),
        };
        output.write_json(value)
    }

    fn create(path: PathBuf) -> anyhow::Result<Self> {
        create_parent_dir(&path)?;
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File(BufWriter::new(file), path))
    }

    fn describe(&self) -> String {
        match self {
            Output::Stdout(_) => "stdout".to_owned(),
            Output::File(_, path) => path.display().to_string(),
        }
    }

    fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let result = match self {
            Output::Stdout(writer) => write_pretty(writer, value),
            Output::File(writer, _) => write_pretty(writer, value),
        };
        result.with_context(|| format!("Failed to write JSON to {}", self.describe()))
    }
}

fn write_pretty<W, T>(mut writer: W, value: &T) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads a perfect-play table written by `precompute-table`.
///
/// A missing file is not an error: the caller falls back to live alpha-beta
/// search, which is correct but much slower.
pub fn read_table_file<P>(path: P) -> anyhow::Result<Option<PerfectPlayTable>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "perfect-play table not found, falling back to live alpha-beta search"
        );
        return Ok(None);
    }
    let table: PerfectPlayTable = read_json_file("perfect-play table", path)?;
    tracing::info!(path = %path.display(), entries = table.len(), "loaded perfect-play table");
    Ok(Some(table))
}

pub fn read_model_file<P>(path: P) -> anyhow::Result<QModel>
where
    P: AsRef<Path>,
{
    read_json_file("Q-learning model", path)
}

/// Opens a CSV report for appending; the header row is only written to a new or
/// empty file.
pub fn append_csv<P>(path: P) -> anyhow::Result<csv::Writer<File>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    create_parent_dir(path)?;
    let has_content = fs::metadata(path).is_ok_and(|m| m.len() > 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    Ok(csv::WriterBuilder::new()
        .has_headers(!has_content)
        .from_writer(file))
}

pub fn create_csv<P>(path: P) -> anyhow::Result<csv::Writer<File>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    create_parent_dir(path)?;
    csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))
}

/// Seeded RNG, or one seeded from the thread RNG when no seed is given.
pub fn make_rng(seed: Option<u64>) -> Pcg64 {
    match seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_rng(&mut rand::rng()),
    }
}

pub fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {unit} ({{eta}})"
            ))
            .expect("progress bar template should always be valid")
            .progress_chars("=>-"),
    );
    pb
}

/// Fresh path under a per-process scratch directory.
#[cfg(test)]
pub(crate) fn test_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("oxo-cli-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = fs::remove_file(&path);
    path
}
