//! Final-recording assembly.
//!
//! Concatenates a finished session's fragments in arrival order into one
//! playable mono 16-bit WAV and hands back a `file://` URL the host can
//! reference. One file per stop; the session epoch is part of the file name
//! so repeated sessions never clobber each other.

use anyhow::Result;
use hound::WavWriter;
use std::fs;
use std::path::{Path, PathBuf};

use super::session::Fragment;

/// Writes finalized recordings to a directory and mints their URLs.
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Concatenates `fragments` in order into one WAV and returns its URL.
    ///
    /// A session with no captured audio still produces a (silent, empty)
    /// recording: exactly one FinalRecording per stop.
    ///
    /// # Errors
    /// - If the directory cannot be created
    /// - If the WAV cannot be written
    pub fn store(&self, epoch: u64, sample_rate: u32, fragments: &[Fragment]) -> Result<String> {
        fs::create_dir_all(&self.dir)?;

        let path = self
            .dir
            .join(format!("ovr-{}-{}.wav", std::process::id(), epoch));

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::create(&path, spec)?;
        let mut sample_count = 0usize;
        for fragment in fragments {
            for &sample in fragment {
                writer.write_sample(sample)?;
            }
            sample_count += fragment.len();
        }
        writer.finalize()?;

        if sample_count == 0 {
            tracing::warn!("Session {} finalized with no captured audio", epoch);
        } else {
            let duration_secs = sample_count as f32 / sample_rate as f32;
            tracing::info!(
                "Recording saved: {} ({:.2}s, {} samples at {}Hz)",
                path.display(),
                duration_secs,
                sample_count,
                sample_rate
            );
        }

        Ok(file_url(&path))
    }
}

/// Builds a RFC 8089 `file://` URL for a local path.
///
/// The path is canonicalized so the URL is absolute, and each segment is
/// percent-encoded so spaces and non-ASCII directory names survive the trip
/// through the host's URL handling.
fn file_url(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut url = String::from("file://");
    for segment in absolute.iter() {
        let segment = segment.to_string_lossy();
        if segment == "/" {
            continue;
        }
        url.push('/');
        url.push_str(&urlencoding::encode(&segment));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_samples(path: &Path) -> Vec<i16> {
        let mut reader = hound::WavReader::open(path).unwrap();
        reader.samples::<i16>().map(|s| s.unwrap()).collect()
    }

    fn url_to_path(url: &str) -> PathBuf {
        let encoded = url.strip_prefix("file://").unwrap();
        PathBuf::from(urlencoding::decode(encoded).unwrap().into_owned())
    }

    #[test]
    fn concatenates_fragments_in_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let fragments = vec![vec![1i16, 2], vec![3], vec![4, 5, 6]];
        let url = store.store(1, 16000, &fragments).unwrap();

        let path = url_to_path(&url);
        assert!(path.exists());
        assert_eq!(read_samples(&path), vec![1, 2, 3, 4, 5, 6]);

        let wav_spec = hound::WavReader::open(&path).unwrap().spec();
        assert_eq!(wav_spec.channels, 1);
        assert_eq!(wav_spec.sample_rate, 16000);
    }

    #[test]
    fn empty_session_still_produces_a_recording() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let url = store.store(2, 48000, &[]).unwrap();
        let path = url_to_path(&url);
        assert!(path.exists());
        assert!(read_samples(&path).is_empty());
    }

    #[test]
    fn sessions_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let first = store.store(1, 16000, &[vec![1i16]]).unwrap();
        let second = store.store(2, 16000, &[vec![2i16]]).unwrap();

        assert_ne!(first, second);
        assert_eq!(read_samples(&url_to_path(&first)), vec![1]);
        assert_eq!(read_samples(&url_to_path(&second)), vec![2]);
    }

    #[test]
    fn file_urls_percent_encode_awkward_segments() {
        let dir = tempfile::tempdir().unwrap();
        let awkward = dir.path().join("with space");
        let store = BlobStore::new(awkward);

        let url = store.store(7, 16000, &[vec![42i16]]).unwrap();

        assert!(url.starts_with("file:///"), "not absolute: {url}");
        assert!(!url.contains(' '), "unencoded space: {url}");
        assert!(url.contains("with%20space"), "segment not encoded: {url}");
        assert_eq!(read_samples(&url_to_path(&url)), vec![42]);
    }
}
