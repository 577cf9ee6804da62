//! End-to-end scenarios through the workspace handle, on in-memory gateways.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::timeout;

use quill::testing::{MemoryFilesystem, MemoryIndex};
use quill::{Notice, StoreError, ViewModel, WorkspaceConfig, WorkspaceHandle};
use quill_api::{document_path, DocumentMeta};

const ROOT: &str = "/notes";

async fn spawn_workspace(
    fs: Arc<MemoryFilesystem>,
    index: Arc<MemoryIndex>,
) -> Result<WorkspaceHandle> {
    Ok(WorkspaceHandle::spawn(WorkspaceConfig::new(ROOT), fs, index).await?)
}

/// Wait until the published view satisfies `predicate`, or fail the test.
async fn wait_for_view(
    handle: &WorkspaceHandle,
    predicate: impl FnMut(&ViewModel) -> bool,
) -> ViewModel {
    let mut rx = handle.subscribe();
    let view = timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("view did not reach expected state in time")
        .expect("workspace stopped")
        .clone();
    view
}

fn seeded_meta(id: &str, title: &str) -> DocumentMeta {
    DocumentMeta {
        id: id.to_string(),
        path: document_path(Path::new(ROOT), title),
        title: title.to_string(),
        created_at: 1_700_000_000_000,
    }
}

#[tokio::test]
async fn create_name_edit_save_round_trip() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs.clone(), index.clone()).await?;

    let id = handle.create().await?;
    handle.open(&id).await?;
    handle.rename(&id, "Notes").await?;
    handle.edit(&id, "# Hi").await?;

    let view = handle.view();
    assert!(view.unsaved_ids.contains(&id));

    handle.save(&id).await?;

    let expected_path = document_path(Path::new(ROOT), "Notes");
    assert_eq!(fs.contents(&expected_path).await.as_deref(), Some("# Hi"));

    let view = handle.view();
    assert!(view.unsaved_ids.is_empty());
    let doc = view.documents.iter().find(|d| d.id == id).unwrap();
    assert!(!doc.is_new);
    assert_eq!(doc.title, "Notes");

    assert_eq!(index.snapshot().await[&id].path, expected_path);
    Ok(())
}

#[tokio::test]
async fn rename_to_taken_title_is_rejected_without_io() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs.clone(), index.clone()).await?;

    let a = handle.create().await?;
    handle.rename(&a, "A").await?;
    let b = handle.create().await?;
    handle.rename(&b, "B").await?;

    let calls_before = fs.call_count();
    let saves_before = index.save_count();

    let err = handle.rename(&b, "A").await.unwrap_err();
    assert!(matches!(err, StoreError::NameTaken(title) if title == "A"));

    assert_eq!(fs.call_count(), calls_before);
    assert_eq!(index.save_count(), saves_before);
    let view = handle.view();
    assert_eq!(
        view.documents.iter().find(|d| d.id == b).unwrap().title,
        "B"
    );
    Ok(())
}

#[tokio::test]
async fn open_with_missing_file_purges_everywhere() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    index.seed([seeded_meta("doc-1", "Ghost")]).await;

    let handle = spawn_workspace(fs, index.clone()).await?;
    let mut notices = handle.notices();

    // The intent itself succeeds: the tab opens while the read is in flight.
    handle.open("doc-1").await?;

    let notice = timeout(Duration::from_secs(2), notices.recv()).await??;
    let Notice::DocumentMissing { id, title } = notice;
    assert_eq!(id, "doc-1");
    assert_eq!(title, "Ghost");

    let view = wait_for_view(&handle, |v| v.documents.is_empty()).await;
    assert!(view.open_documents.is_empty());
    assert_eq!(view.active, None);
    assert!(index.snapshot().await.is_empty());

    // The old id is gone for good.
    let err = handle.open("doc-1").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn saved_body_survives_a_reload() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();

    let handle = spawn_workspace(fs.clone(), index.clone()).await?;
    let id = handle.create().await?;
    handle.rename(&id, "Persist").await?;
    handle.edit(&id, "saved body").await?;
    handle.save(&id).await?;
    handle.shutdown().await?;

    // Same stores, fresh session: the index remembers the document, the body
    // comes back from the file.
    let handle = spawn_workspace(fs, index).await?;
    handle.open(&id).await?;
    let view = wait_for_view(&handle, |v| {
        v.active.as_ref().is_some_and(|a| a.body.is_some())
    })
    .await;
    assert_eq!(view.active.unwrap().body.as_deref(), Some("saved body"));
    Ok(())
}

#[tokio::test]
async fn closing_active_tab_follows_original_order() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs, index).await?;

    let a = handle.create().await?;
    let b = handle.create().await?;
    let c = handle.create().await?;
    handle.open(&a).await?;
    handle.open(&b).await?;
    handle.open(&c).await?;

    handle.close(&c).await?;
    assert_eq!(handle.view().active.unwrap().id, a);

    handle.focus(&b).await?;
    handle.close(&b).await?;
    assert_eq!(handle.view().active.unwrap().id, a);

    handle.close(&a).await?;
    let view = handle.view();
    assert_eq!(view.active, None);
    assert!(view.open_documents.is_empty());
    Ok(())
}

#[tokio::test]
async fn focus_requires_an_open_tab() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs, index).await?;

    let a = handle.create().await?;
    let err = handle.focus(&a).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn deleting_a_never_saved_document_is_memory_only() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs.clone(), index.clone()).await?;

    let id = handle.create().await?;
    handle.open(&id).await?;
    handle.edit(&id, "scratch").await?;
    handle.delete(&id).await?;

    let view = handle.view();
    assert!(view.documents.is_empty());
    assert!(view.open_documents.is_empty());
    assert!(view.unsaved_ids.is_empty());
    assert_eq!(fs.call_count(), 0);
    assert_eq!(index.save_count(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_delete_leaves_document_and_tab_alone() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs.clone(), index.clone()).await?;

    let id = handle.create().await?;
    handle.rename(&id, "Sticky").await?;
    handle.open(&id).await?;

    fs.fail_deletes(true);
    let err = handle.delete(&id).await.unwrap_err();
    assert!(matches!(err, StoreError::Fs(_)));

    let view = handle.view();
    assert_eq!(view.documents.len(), 1);
    assert_eq!(view.open_documents.len(), 1);
    assert!(index.snapshot().await.contains_key(&id));
    Ok(())
}

#[tokio::test]
async fn delete_during_read_does_not_resurrect() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    index.seed([seeded_meta("doc-1", "Slow")]).await;
    fs.insert(document_path(Path::new(ROOT), "Slow"), "slow body")
        .await;
    fs.set_read_delay(Duration::from_millis(50)).await;

    let handle = spawn_workspace(fs, index.clone()).await?;
    let mut notices = handle.notices();

    handle.open("doc-1").await?;
    handle.delete("doc-1").await?;

    // Let the stale read land; it must neither resurrect the document nor
    // masquerade as a missing-document failure.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let view = handle.view();
    assert!(view.documents.is_empty());
    assert!(view.open_documents.is_empty());
    assert!(matches!(
        notices.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
    assert!(index.snapshot().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn rename_during_read_drops_stale_not_found() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    index.seed([seeded_meta("doc-1", "Old")]).await;
    fs.insert(document_path(Path::new(ROOT), "Old"), "the body")
        .await;
    fs.set_read_delay(Duration::from_millis(50)).await;

    let handle = spawn_workspace(fs, index.clone()).await?;

    // The read of Old.md is in flight when the rename moves the file; its
    // NotFound completion must not purge the renamed document.
    handle.open("doc-1").await?;
    handle.rename("doc-1", "New").await?;

    tokio::time::sleep(Duration::from_millis(150)).await;
    let view = handle.view();
    assert_eq!(view.documents.len(), 1);
    assert_eq!(view.documents[0].title, "New");

    // A second open reads from the new path and loads the body.
    handle.open("doc-1").await?;
    let view = wait_for_view(&handle, |v| {
        v.active.as_ref().is_some_and(|a| a.body.is_some())
    })
    .await;
    assert_eq!(view.active.unwrap().body.as_deref(), Some("the body"));
    assert_eq!(index.snapshot().await["doc-1"].title, "New");
    Ok(())
}

#[tokio::test]
async fn filter_drives_the_visible_list() -> Result<()> {
    let fs = MemoryFilesystem::new();
    let index = MemoryIndex::new();
    let handle = spawn_workspace(fs, index).await?;

    let a = handle.create().await?;
    handle.rename(&a, "Groceries").await?;
    let b = handle.create().await?;
    handle.rename(&b, "Great ideas").await?;

    handle.set_filter("Gr").await?;
    assert_eq!(handle.view().documents.len(), 2);

    handle.set_filter("Groc").await?;
    let view = handle.view();
    assert_eq!(view.documents.len(), 1);
    assert_eq!(view.documents[0].title, "Groceries");

    handle.set_filter("").await?;
    assert_eq!(handle.view().documents.len(), 2);
    Ok(())
}
