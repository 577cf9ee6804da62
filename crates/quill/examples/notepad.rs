//! Line-mode driver for the workspace core.
//!
//! Not an editor — just enough of a presentation layer to exercise every
//! intent against the real filesystem gateways:
//!
//! ```text
//! cargo run --example notepad -- /tmp/quill-notes
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use quill::{WorkspaceConfig, WorkspaceHandle};
use quill_filesystem::{JsonMetadataIndex, LocalFilesystem};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./quill-notes"));
    let index_path = root.join("documents.json");

    let handle = WorkspaceHandle::spawn(
        WorkspaceConfig::new(&root),
        Arc::new(LocalFilesystem::new()),
        Arc::new(JsonMetadataIndex::new(index_path)),
    )
    .await?;

    let mut notices = handle.notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            eprintln!("!! {notice:?}");
        }
    });

    println!("commands: ls | new | open <n> | tabs | edit <text> | rename <title> | save | rm <n> | filter <kw> | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, arg) = match line.split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };
        let view = handle.view();
        let nth = |raw: &str| {
            raw.parse::<usize>()
                .ok()
                .and_then(|n| view.documents.get(n))
                .map(|d| d.id.clone())
        };
        let active = view.active.as_ref().map(|a| a.id.clone());

        let outcome = match (cmd, arg) {
            ("ls", _) => {
                for (n, doc) in view.documents.iter().enumerate() {
                    let marker = if doc.is_unsaved { "*" } else { " " };
                    println!("{n}{marker} {}", if doc.title.is_empty() { "(untitled)" } else { &doc.title });
                }
                Ok(())
            }
            ("tabs", _) => {
                for doc in &view.open_documents {
                    let focus = if Some(&doc.id) == active.as_ref() { ">" } else { " " };
                    println!("{focus} {}", doc.title);
                }
                Ok(())
            }
            ("new", _) => {
                let id = handle.create().await?;
                handle.open(&id).await
            }
            ("open", n) => match nth(n) {
                Some(id) => handle.open(&id).await,
                None => {
                    println!("no such entry");
                    Ok(())
                }
            },
            ("edit", text) => match &active {
                Some(id) => handle.edit(id, text).await,
                None => {
                    println!("nothing open");
                    Ok(())
                }
            },
            ("rename", title) => match &active {
                Some(id) => handle.rename(id, title).await,
                None => {
                    println!("nothing open");
                    Ok(())
                }
            },
            ("save", _) => match &active {
                Some(id) => handle.save(id).await,
                None => {
                    println!("nothing open");
                    Ok(())
                }
            },
            ("rm", n) => match nth(n) {
                Some(id) => handle.delete(&id).await,
                None => {
                    println!("no such entry");
                    Ok(())
                }
            },
            ("filter", kw) => handle.set_filter(kw).await,
            ("quit", _) => break,
            _ => {
                println!("unknown command");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            println!("error: {err}");
        }
    }

    handle.shutdown().await?;
    Ok(())
}
