//! Committed-FEN output.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Callback invoked with each newly committed FEN, in commitment order.
pub trait FenBroadcast {
    fn publish(&mut self, fen: &str) -> Result<()>;
}

/// Appends one FEN per line to `game_fens.csv`, flushing per commitment so
/// the file is usable while the game is still running.
pub struct CsvBroadcast {
    file: File,
}

impl CsvBroadcast {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        Ok(Self { file })
    }
}

impl FenBroadcast for CsvBroadcast {
    fn publish(&mut self, fen: &str) -> Result<()> {
        writeln!(self.file, "{fen}").context("appending committed FEN")?;
        self.file.flush().context("flushing committed FEN")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn appends_one_fen_per_line() {
        let path = std::env::temp_dir().join(format!(
            "kingsight_broadcast_test_{}.csv",
            std::process::id()
        ));

        let mut broadcast = CsvBroadcast::create(&path).unwrap();
        broadcast.publish("fen-one").unwrap();
        broadcast.publish("fen-two").unwrap();
        drop(broadcast);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "fen-one\nfen-two\n");
        fs::remove_file(&path).ok();
    }
}
