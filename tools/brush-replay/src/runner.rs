//! 程序运行函数.

use crate::result::ReplayResult;
use crate::script::{Event, Script};
use crate::Args;
use nii_paint::{ImgWriteVis, PainterConfig, Session, VolumeGeometry};
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// 获取数据目录.
///
/// 1. 若环境变量 `$NII_PAINT_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset`.
pub fn data_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("NII_PAINT_DATA_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dirs::home_dir().map(|h| h.join("dataset")),
    }
}

/// 相对路径以数据目录为基准.
fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match data_dir_from_env_or_home() {
        Some(dir) if dir.join(path).exists() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// 默认的标签输出路径: `<目录>/<名称>_labels.nii.gz`.
fn default_output(volume: &Path) -> PathBuf {
    let name = volume
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".gz")
        .unwrap_or(&name)
        .trim_end_matches(".nii");
    volume.with_file_name(format!("{stem}_labels.nii.gz"))
}

/// 将单个事件喂给会话, 返回实际改变的体素个数.
fn apply(session: &mut Session, event: &Event) -> Result<usize, Box<dyn Error>> {
    let changed = match event {
        Event::Down { x, y } => session.on_pointer_down((*x, *y)),
        Event::Move { x, y } => session.on_pointer_move((*x, *y)),
        Event::Up => {
            session.on_pointer_up();
            0
        }
        Event::Scroll { delta } => {
            session.on_scroll(*delta);
            0
        }
        Event::Slice { index } => {
            session.set_slice_index(*index);
            0
        }
        Event::Brush { size, label } => {
            if let Some(size) = size {
                session.set_brush_size(*size);
            }
            if let Some(label) = label {
                session
                    .set_brush_label(*label)
                    .map_err(|e| format!("Invalid brush in script: {e:?}"))?;
            }
            0
        }
        Event::Resize { width, height } => {
            session.on_resize((*width, *height));
            0
        }
        Event::Clear => {
            session.clear_all();
            0
        }
        Event::LoadLabels { path } => {
            session.load_external_labels(resolve(path))?;
            0
        }
    };
    Ok(changed)
}

/// 实际运行.
pub fn run(args: &Args) -> Result<ReplayResult, Box<dyn Error>> {
    let volume = resolve(&args.volume);
    let script = Script::from_path(&args.script)?;

    let mut session = Session::new(PainterConfig::from_env());
    if let Some(size) = script.display {
        session.on_resize(size);
    }
    session.load_volume(&volume)?;

    let start = Instant::now();
    let mut result = ReplayResult::new(session.labels().map(|l| l.shape()).unwrap_or_default());
    for event in script.events.iter() {
        let slice = session.current_slice_index().unwrap_or_default();
        let changed = apply(&mut session, event)?;
        result.record(slice, changed);
    }
    result.set_elapsed(start.elapsed());

    let output = args.output.clone().unwrap_or_else(|| default_output(&volume));
    result.set_saved(session.save_labels(output)?);

    if let Some(labels) = session.labels() {
        result.set_histogram(labels.histogram());
    }
    if let Some(dir) = args.preview.as_deref() {
        export_preview(&session, dir)?;
    }
    Ok(result)
}

/// 导出当前切片的标签和强度 PNG.
fn export_preview(session: &Session, dir: &Path) -> Result<(), Box<dyn Error>> {
    let (Some(z), Some(volume), Some(labels)) = (
        session.current_slice_index(),
        session.volume(),
        session.labels(),
    ) else {
        return Ok(());
    };
    std::fs::create_dir_all(dir)?;
    labels.slice_at(z).save(dir.join(format!("label_{z:03}.png")))?;
    volume
        .slice_at(z)
        .save_with(dir.join(format!("scan_{z:03}.png")), &volume.intensity_window())?;
    log::info!("Preview of slice {z} written to `{}`", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{default_output, run};
    use crate::Args;
    use ndarray::{Array3, Ix3};
    use nifti::writer::WriterOptions;
    use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn temp(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("brush-replay-{}-{name}", std::process::id()))
    }

    fn args(volume: &Path, script: &Path, output: &Path) -> Args {
        Args {
            volume: volume.to_path_buf(),
            script: script.to_path_buf(),
            output: Some(output.to_path_buf()),
            preview: None,
            verbose: 0,
        }
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/d/ct_01.nii.gz")),
            PathBuf::from("/d/ct_01_labels.nii.gz")
        );
        assert_eq!(
            default_output(Path::new("ct.nii")),
            PathBuf::from("ct_labels.nii.gz")
        );
    }

    #[test]
    fn test_replay_saves_painted_labels() {
        let (volume, script, output) = (temp("vol.nii.gz"), temp("ok.json"), temp("ok.nii.gz"));
        WriterOptions::new(&volume)
            .reference_header(&NiftiHeader {
                scl_slope: 1.0,
                ..Default::default()
            })
            .write_nifti(&Array3::<f32>::from_elem((4, 4, 2), 1.0))
            .unwrap();
        fs::write(
            &script,
            r#"{
                "display": [4, 4],
                "events": [
                    { "op": "brush", "size": 0, "label": 2 },
                    { "op": "down", "x": 0, "y": 0 },
                    { "op": "move", "x": 3, "y": 0 },
                    { "op": "up" },
                    { "op": "move", "x": 3, "y": 3 }
                ]
            }"#,
        )
        .unwrap();

        run(&args(&volume, &script, &output)).unwrap();
        let labels = ReaderOptions::new()
            .read_file(&output)
            .unwrap()
            .into_volume()
            .into_ndarray::<f32>()
            .unwrap()
            .into_dimensionality::<Ix3>()
            .unwrap();
        assert_eq!(labels.dim(), (4, 4, 2));
        assert_eq!(labels.iter().filter(|v| **v == 2.0).count(), 4);
        assert_eq!(labels.iter().filter(|v| **v == 0.0).count(), 28);

        // 非法标签使回放失败, 不写出任何文件.
        let (bad, bad_out) = (temp("bad.json"), temp("bad.nii.gz"));
        fs::write(&bad, r#"{ "events": [{ "op": "brush", "label": 42 }] }"#).unwrap();
        assert!(run(&args(&volume, &bad, &bad_out)).is_err());
        assert!(!bad_out.exists());

        for p in [volume, script, output, bad] {
            let _ = fs::remove_file(p);
        }
    }
}
