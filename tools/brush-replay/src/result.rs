//! 回放结果.

use nii_paint::consts::label;
use nii_paint::Idx3d;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SEP: &str = "--------------------------------------------------------";

/// 一次回放的统计结果.
#[derive(Debug, Default)]
pub struct ReplayResult {
    shape: Idx3d,
    events: usize,
    changed: usize,
    per_slice: BTreeMap<usize, usize>,
    elapsed: Duration,
    saved: Option<PathBuf>,
    histogram: Option<[usize; label::LABEL_COUNT + 1]>,
}

impl ReplayResult {
    pub fn new(shape: Idx3d) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// 记录一个事件在第 `slice` 层改变了 `changed` 个体素.
    pub fn record(&mut self, slice: usize, changed: usize) {
        self.events += 1;
        self.changed += changed;
        if changed > 0 {
            *self.per_slice.entry(slice).or_default() += changed;
        }
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn set_saved(&mut self, path: PathBuf) {
        self.saved = Some(path);
    }

    pub fn set_histogram(&mut self, histogram: [usize; label::LABEL_COUNT + 1]) {
        self.histogram = Some(histogram);
    }

    /// 将结果写进 `w` 中.
    fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        const S4: &str = "    ";

        writeln!(w, "Replay:")?;
        writeln!(w, "{S4}Working shape: {:?}", self.shape)?;
        writeln!(w, "{S4}Events: {}", self.events)?;
        writeln!(w, "{S4}Voxels changed: {}", self.changed)?;
        writeln!(w, "{S4}Replay time: {} us", self.elapsed.as_micros())?;
        for (z, n) in self.per_slice.iter() {
            writeln!(w, "{S4}{S4}slice {z}: {n}")?;
        }
        if let Some(h) = &self.histogram {
            writeln!(w, "Labels:")?;
            for (code, n) in h.iter().enumerate().filter(|(_, n)| **n > 0) {
                writeln!(w, "{S4}{:>8}: {n}", label::name(code as u8).unwrap_or("?"))?;
            }
        }
        let saved = self.saved.as_deref().map_or("/".into(), Path::to_string_lossy);
        write!(w, "Saved to: {saved}")?;
        Ok(())
    }

    /// 打印回放结果.
    pub fn analyze(&self) {
        let mut buf = Vec::with_capacity(512);
        match self.describe_into(&mut buf) {
            Ok(()) => {
                println!("{SEP}");
                println!("{}", String::from_utf8_lossy(&buf));
                println!("{SEP}");
            }
            Err(e) => log::error!("Result formatting error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReplayResult;
    use std::path::PathBuf;

    #[test]
    fn test_describe() {
        let mut r = ReplayResult::new((4, 5, 3));
        r.record(2, 5);
        r.record(2, 0);
        r.record(3, 7);
        r.set_histogram([48, 12, 0, 0, 0, 0, 0]);
        r.set_saved(PathBuf::from("out.nii.gz"));

        let mut buf = Vec::new();
        r.describe_into(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Events: 3"));
        assert!(text.contains("Voxels changed: 12"));
        assert!(text.contains("slice 3: 7"));
        assert!(text.ends_with("Saved to: out.nii.gz"));
    }
}
