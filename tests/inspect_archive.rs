//! Upload archives to the in-memory gateway, then inspect them by locator.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{Cursor, Write};
use std::sync::Arc;

use arclift::archive::{ArchiveInspector, InspectError};
use arclift::cache::TreeCache;
use arclift::gateway::AuthToken;
use arclift::gateway::memory::MemoryGateway;
use arclift::tree::{NodeKind, NodePath, TreeView};
use arclift::upload::{ChunkPlanner, MAX_PART_SIZE, MemorySource, UploadCoordinator};

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }
    buf
}

fn build_targz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let encoder = GzEncoder::new(&mut out, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
    out
}

async fn upload(gateway: &Arc<MemoryGateway>, name: &str, data: Vec<u8>) -> String {
    let planner = ChunkPlanner::new(128, MAX_PART_SIZE).unwrap();
    let mut coordinator = UploadCoordinator::new(gateway.clone(), AuthToken::anonymous(), planner);
    coordinator
        .upload(&mut MemorySource::new(name, data))
        .await
        .unwrap()
        .locator
}

fn inspector(gateway: &Arc<MemoryGateway>) -> ArchiveInspector {
    ArchiveInspector::new(gateway.clone(), TreeCache::new(8))
}

#[tokio::test]
async fn test_inspect_uploaded_zip() {
    let gateway = Arc::new(MemoryGateway::new());
    let data = build_zip(&[
        ("Takeout/Mail/inbox.mbox", b"From: a"),
        ("Takeout/Drive/notes.txt", b"notes"),
        ("Takeout/index.html", b"<html/>"),
    ]);
    let locator = upload(&gateway, "takeout.zip", data).await;

    let tree = inspector(&gateway).inspect(&locator).await.unwrap();

    let takeout = tree.child("Takeout").unwrap();
    assert!(takeout.is_dir());
    let names: Vec<&str> = takeout.list().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Drive", "Mail", "index.html"]);
    assert_eq!(
        tree.find(&NodePath::parse("Takeout/Mail/inbox.mbox"))
            .unwrap()
            .kind(),
        NodeKind::File
    );
    assert_eq!(tree.file_count(), 3);
    assert_eq!(tree.dir_count(), 3);
}

#[tokio::test]
async fn test_inspect_uploaded_targz_and_browse() {
    let gateway = Arc::new(MemoryGateway::new());
    let data = build_targz(&[
        ("export/posts/1.json", b"{}"),
        ("export/posts/2.json", b"{}"),
        ("export/profile.json", b"{}"),
    ]);
    let locator = upload(&gateway, "export.tar.gz", data).await;

    let tree = inspector(&gateway).inspect(&locator).await.unwrap();

    let mut view = TreeView::new();
    let keys = |view: &TreeView| -> Vec<String> {
        view.visible_rows(&tree).iter().map(|r| r.path.key()).collect()
    };
    assert_eq!(keys(&view), vec!["export"]);

    view.toggle("export");
    view.toggle("export/posts");
    assert_eq!(
        keys(&view),
        vec![
            "export",
            "export/posts",
            "export/posts/1.json",
            "export/posts/2.json",
            "export/profile.json"
        ]
    );
}

#[tokio::test]
async fn test_garbage_archive_is_decode_error() {
    let gateway = Arc::new(MemoryGateway::new());
    let locator = upload(&gateway, "broken.zip", b"this is not a zip file".to_vec()).await;

    let inspector = inspector(&gateway);
    let err = inspector.inspect(&locator).await.unwrap_err();
    assert!(matches!(err, InspectError::Decode(_)));
    assert!(inspector.cache().is_empty());
}

#[tokio::test]
async fn test_unsupported_and_missing_objects() {
    let gateway = Arc::new(MemoryGateway::new());
    let inspector = inspector(&gateway);

    let locator = upload(&gateway, "notes.txt", b"plain".to_vec()).await;
    assert!(matches!(
        inspector.inspect(&locator).await.unwrap_err(),
        InspectError::UnsupportedFormat(_)
    ));

    assert!(matches!(
        inspector.inspect("memory://nowhere/a.zip").await.unwrap_err(),
        InspectError::Fetch(_)
    ));
}

#[tokio::test]
async fn test_repeat_inspection_is_cached() {
    let gateway = Arc::new(MemoryGateway::new());
    let locator = upload(&gateway, "a.zip", build_zip(&[("a.txt", b"a")])).await;
    let inspector = inspector(&gateway);

    let first = inspector.inspect(&locator).await.unwrap();
    let second = inspector.inspect(&locator).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(inspector.cache().len(), 1);
}

#[tokio::test]
async fn test_strict_mode_rejects_file_directory_conflict() {
    let gateway = Arc::new(MemoryGateway::new());
    let data = build_zip(&[("data", b"file"), ("data/inner.txt", b"child")]);
    let locator = upload(&gateway, "clash.zip", data).await;

    // Default keeps the last declaration
    let tree = inspector(&gateway).inspect(&locator).await.unwrap();
    assert!(tree.child("data").unwrap().is_dir());

    let strict = inspector(&gateway).with_strict_conflicts(true);
    assert!(matches!(
        strict.inspect(&locator).await.unwrap_err(),
        InspectError::Conflict(_)
    ));
}
