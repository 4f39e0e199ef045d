//! End-to-end flows through the store, the pipeline, and the exporter.

use anyhow::Result;
use tempfile::TempDir;

use codeloom::core::export::export_files;
use codeloom::core::generate::{self, TextGenerator};
use codeloom::core::workspace::{FileContent, FileMap, Workspace};
use codeloom::infra::store::{ChatMessage, Store};

/// Generator that hands out scripted replies in order.
struct Scripted(Vec<&'static str>);

impl TextGenerator for Scripted {
    fn generate(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.0.remove(0).to_string())
    }
}

fn seeded_store(tmp: &TempDir) -> Result<(Store, String)> {
    let store = Store::open(tmp.path())?;
    store.create_user("Dev", "dev@example.com", 55_000)?;

    let mut files = FileMap::new();
    files.insert(
        "/index.js".to_string(),
        FileContent::plain("// Write your code here..."),
    );
    let record = store.create_workspace("dev@example.com", Vec::new(), files)?;
    Ok((store, record.id))
}

#[test]
fn generation_then_folder_rename_round_trips() -> Result<()> {
    let tmp = TempDir::new()?;
    let (store, id) = seeded_store(&tmp)?;

    let reply = r#"Here is the project.

<<<FILE /src/App.js>>>
```jsx
export default function App() {}
```

<<<FILE /src/styles.css>>>
body { margin: 0; }

<<<FILE /package.json>>>
{ "name": "demo" }
"#;

    let mut generator = Scripted(vec![reply]);
    let report = generate::run_generation(&store, &id, Some("build a demo"), &mut generator, false)?;
    assert_eq!(report.applied.as_ref().map(Vec::len), Some(3));

    // Parsed files replaced the seed entirely; fences are stripped
    let record = store.get_workspace(&id)?;
    assert_eq!(
        record.files.get("/src/App.js"),
        Some(&FileContent::coded("export default function App() {}"))
    );
    assert!(!record.files.contains_key("/index.js"));

    // Rename the folder, persist, reload: the cascade survives the disk trip
    let mut ws = Workspace::load(record.files, record.selected);
    let moves = ws.rename("/src", "app");
    assert!(
        moves
            .iter()
            .any(|(from, to)| from == "/src/App.js" && to == "/app/App.js")
    );
    store.update_files(&id, ws.files().clone(), ws.selected().map(str::to_string))?;

    let record = store.get_workspace(&id)?;
    assert!(record.files.contains_key("/app/styles.css"));
    assert!(record.files.contains_key("/package.json"));

    // Owner paid for the generated words
    assert!(store.get_user("dev@example.com")?.token < 55_000);
    Ok(())
}

#[test]
fn chat_turn_then_depleted_balance_refuses() -> Result<()> {
    let tmp = TempDir::new()?;
    let (store, id) = seeded_store(&tmp)?;

    let mut generator = Scripted(vec!["Plan: scaffold first, then styling."]);
    let chat = generate::run_chat(&store, &id, "what is the plan?", &mut generator, false)?;
    assert!(chat.cost > 0);

    let record = store.get_workspace(&id)?;
    assert_eq!(record.messages.len(), 2);
    assert_eq!(record.messages[0], ChatMessage::user("what is the plan?"));

    // Drop the balance below the gate and try again
    store.update_token("dev@example.com", 3)?;
    let mut generator = Scripted(vec!["never consulted"]);
    let err = generate::run_generation(&store, &id, None, &mut generator, false).unwrap_err();
    assert!(err.to_string().contains("not enough tokens"));
    Ok(())
}

#[test]
fn markerless_reply_keeps_files_and_export_writes_them() -> Result<()> {
    let tmp = TempDir::new()?;
    let (store, id) = seeded_store(&tmp)?;

    let mut generator = Scripted(vec!["No files here, just advice."]);
    let report = generate::run_generation(&store, &id, None, &mut generator, false)?;
    assert_eq!(report.applied, None);

    let record = store.get_workspace(&id)?;
    assert!(record.files.contains_key("/index.js"));
    assert_eq!(
        record.messages.last().map(|m| m.content.as_str()),
        Some("No files here, just advice.")
    );

    let out = tmp.path().join("site");
    let written = export_files(&record.files, &out, false)?;
    assert_eq!(written.len(), 1);
    assert_eq!(
        std::fs::read_to_string(out.join("index.js"))?,
        "// Write your code here..."
    );
    Ok(())
}
