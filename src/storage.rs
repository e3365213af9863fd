use crate::ledger::Ledger;
use anyhow::Context;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

pub trait Storage {
    /// Charge un ledger depuis un support.
    fn load(&self) -> anyhow::Result<Ledger>;
    /// Sauvegarde de manière atomique.
    fn save(&self, ledger: &Ledger) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ledger vide si le fichier n'existe pas encore.
    pub fn load_or_default(&self) -> anyhow::Result<Ledger> {
        if !self.path.exists() {
            return Ok(Ledger::default());
        }
        self.load()
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Ledger> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let ledger: Ledger = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        ledger
            .validate()
            .with_context(|| format!("validating {}", self.path.display()))?;
        Ok(ledger)
    }

    /// Fichier temporaire voisin puis renommage : un lecteur voit l'ancien
    /// ledger ou le nouveau, jamais un fichier tronqué.
    fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let dir = self.dir();
        let mut tmp = Builder::new()
            .prefix(".ledger-")
            .suffix(".json.tmp")
            .tempfile_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, ledger).context("serializing ledger")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            bookings = ledger.bookings().len(),
            "ledger saved"
        );
        Ok(())
    }
}
