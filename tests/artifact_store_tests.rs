// Integration tests for artifact assembly and object URL stores
//
// These tests verify blob assembly from chunks, and that both the in-memory
// and the on-disk URL stores mint, resolve and revoke artifacts.

use anyhow::Result;
use hound::WavReader;
use softphone_recorder::recorder::{
    pcm_mime, Blob, FileObjectUrls, MediaChunk, MemoryObjectUrls, ObjectUrls,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn path_of(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("file://").expect("file URL"))
}

#[test]
fn test_blob_from_no_chunks_is_none() {
    assert!(Blob::from_chunks(&[]).is_none());
}

#[test]
fn test_blob_takes_mime_of_first_chunk() {
    let chunks = vec![
        MediaChunk::new(vec![1, 2], "audio/webm;codecs=opus"),
        MediaChunk::new(vec![3], "audio/webm"),
    ];

    let blob = Blob::from_chunks(&chunks).expect("blob");
    assert_eq!(blob.data(), &[1, 2, 3]);
    assert_eq!(blob.mime_type(), "audio/webm;codecs=opus");
    assert_eq!(blob.size(), 3);
}

#[test]
fn test_memory_urls_mint_resolve_revoke() {
    let urls = MemoryObjectUrls::new();

    let a = urls.create_object_url(Blob::new(vec![1], "audio/webm")).unwrap();
    let b = urls.create_object_url(Blob::new(vec![2], "audio/webm")).unwrap();
    assert!(a.starts_with("blob:"));
    assert_ne!(a, b);
    assert_eq!(urls.live_count(), 2);

    urls.revoke_object_url(&a);
    assert!(urls.resolve(&a).is_none());
    assert_eq!(urls.resolve(&b).map(|blob| blob.data().to_vec()), Some(vec![2]));
    assert_eq!(urls.live_count(), 1);

    // Unknown and repeated revokes are ignored
    urls.revoke_object_url(&a);
    urls.revoke_object_url("blob:unknown");
    assert_eq!(urls.live_count(), 1);
}

#[test]
fn test_file_urls_wrap_pcm_in_wav() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let urls = FileObjectUrls::new(temp_dir.path().join("recordings"))?;

    let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN];
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    let url = urls.create_object_url(Blob::new(data, pcm_mime(16000, 1)))?;
    assert!(url.starts_with("file://"));

    let path = path_of(&url);
    assert!(path.exists());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));

    let mut reader = WavReader::open(&path)?;
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 1);
    let read: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    assert_eq!(read, samples);

    let blob = urls.resolve(&url).expect("resolvable");
    assert_eq!(blob.mime_type(), "audio/wav");

    Ok(())
}

#[test]
fn test_file_urls_store_other_formats_verbatim() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let urls = FileObjectUrls::new(temp_dir.path())?;

    let url = urls.create_object_url(Blob::new(vec![0x1a, 0x45, 0xdf, 0xa3], "audio/webm;codecs=opus"))?;
    let path = path_of(&url);

    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("webm"));
    assert_eq!(std::fs::read(&path)?, vec![0x1a, 0x45, 0xdf, 0xa3]);

    let blob = urls.resolve(&url).expect("resolvable");
    assert_eq!(blob.mime_type(), "audio/webm;codecs=opus");

    Ok(())
}

#[test]
fn test_file_urls_revoke_deletes_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let urls = FileObjectUrls::new(temp_dir.path())?;

    let url = urls.create_object_url(Blob::new(vec![1, 2, 3, 4], pcm_mime(8000, 1)))?;
    let path = path_of(&url);
    assert!(path.exists());
    assert_eq!(urls.live_count(), 1);

    urls.revoke_object_url(&url);

    assert!(!path.exists());
    assert!(urls.resolve(&url).is_none());
    assert_eq!(urls.live_count(), 0);

    Ok(())
}
