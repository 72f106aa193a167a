//! WAV files as a read-only container: the root holds a single `audio`
//! dataset, `[frames]` for mono or `[frames, channels]` interleaved.

use crate::error::{Result, StoreError};
use crate::store::{normalize_path, resolve_columns, Attributes, AttrValue, Container, DType, Dataset, Node};
use hound::{SampleFormat, WavReader, WavSpec};
use std::path::{Path, PathBuf};

pub const AUDIO_DATASET: &str = "audio";

#[derive(Clone, Debug)]
pub struct WavContainer {
    path: PathBuf,
    spec: WavSpec,
    frames: u32,
}

impl WavContainer {
    /// Read the header only; samples are decoded on [`Container::read_dataset`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = WavReader::open(&path)?;
        let spec = reader.spec();
        let frames = reader.duration();
        log::debug!(
            "{}: {} Hz, {} ch, {} bit {:?}, {frames} frames",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );
        Ok(Self { path, spec, frames })
    }

    fn shape(&self) -> Vec<usize> {
        match self.spec.channels {
            1 => vec![self.frames as usize],
            ch => vec![self.frames as usize, ch as usize],
        }
    }

    fn dtype(&self) -> DType {
        match (self.spec.sample_format, self.spec.bits_per_sample) {
            (SampleFormat::Float, _) => DType::Float32,
            (SampleFormat::Int, 8) => DType::Int8,
            (SampleFormat::Int, 16) => DType::Int16,
            (SampleFormat::Int, _) => DType::Int32,
        }
    }

    fn audio_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("sample_rate".into(), AttrValue::Int(self.spec.sample_rate as i64));
        attrs.insert("bits_per_sample".into(), AttrValue::Int(self.spec.bits_per_sample as i64));
        let format = match self.spec.sample_format {
            SampleFormat::Float => "float",
            SampleFormat::Int => "int",
        };
        attrs.insert("sample_format".into(), format.into());
        attrs.insert("fs".into(), AttrValue::Float(self.spec.sample_rate as f64));
        attrs
    }

    /// Samples scaled to [-1, 1).
    fn decode(&self) -> Result<Vec<f64>> {
        let mut reader = WavReader::open(&self.path)?;
        match self.spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(f64::from).map_err(StoreError::from))
                .collect(),
            SampleFormat::Int => {
                let scale = (1u64 << (self.spec.bits_per_sample.clamp(1, 32) - 1)) as f64;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f64 / scale).map_err(StoreError::from))
                    .collect()
            }
        }
    }
}

impl Container for WavContainer {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load_structure(&self) -> Result<Node> {
        let mut root = Node::root(Attributes::new());
        root.children.push(Node::dataset(
            AUDIO_DATASET,
            &format!("/{AUDIO_DATASET}"),
            self.audio_attributes(),
            self.shape(),
            self.dtype(),
        ));
        Ok(root)
    }

    fn read_dataset(&self, path: &str) -> Result<Dataset> {
        match normalize_path(path).as_str() {
            "/audio" => {}
            "/" => return Err(StoreError::NotADataset(path.to_string())),
            _ => return Err(StoreError::NotFound(path.to_string())),
        }
        let values = self.decode()?;
        let shape = self.shape();
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(StoreError::Shape {
                path: path.to_string(),
                expected,
                actual: values.len(),
            });
        }
        let dtype = self.dtype();
        Ok(Dataset {
            columns: resolve_columns(&self.audio_attributes(), &dtype, &shape),
            shape,
            dtype,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavWriter;
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_mono() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, 16384, -32768]);

        let wav = WavContainer::open(&path).unwrap();
        let root = wav.load_structure().unwrap();
        let node = root.find("/audio").unwrap();
        assert_eq!(node.shape, Some(vec![3]));
        assert_eq!(node.attributes["fs"].as_f64(), Some(48_000.0));

        let ds = wav.read_dataset("audio").unwrap();
        assert_eq!(ds.values, vec![0.0, 0.5, -1.0]);
        assert_eq!(ds.dtype, DType::Int16);
        assert_eq!(ds.columns, vec!["Value"]);
    }

    #[test]
    fn test_float_samples_pass_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.75, 1.0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let wav = WavContainer::open(&path).unwrap();
        let info = wav.dataset_info("/audio").unwrap();
        assert_eq!(info.dtype, DType::Float32);
        assert_eq!(info.attributes["sample_format"], AttrValue::from("float"));
        assert_eq!(info.attributes["bits_per_sample"], AttrValue::Int(32));

        let ds = wav.read_dataset("/audio").unwrap();
        assert_eq!(ds.values, vec![0.25, -0.75, 1.0]);
    }

    #[test]
    fn test_stereo_is_interleaved_matrix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[0, 8192, 16384, -16384]);

        let wav = WavContainer::open(&path).unwrap();
        let ds = wav.read_dataset("/audio").unwrap();
        assert_eq!(ds.shape, vec![2, 2]);
        assert_eq!(ds.column(1).unwrap(), vec![0.25, -0.5]);
        assert_eq!(ds.columns, vec!["Column_0", "Column_1"]);
        assert!(matches!(wav.read_dataset("/other"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_not_a_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(matches!(WavContainer::open(&path), Err(StoreError::Wav(_))));
    }
}
