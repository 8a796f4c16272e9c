use std::{
    path::{Path, PathBuf},
    process::Output,
};

fn run(data_dir: &Path, args: &[&str]) -> Output {
    std::process::Command::new(cartorio_bin())
        .args(args)
        .env("CARTORIO_DATA_DIR", data_dir)
        .env("CARTORIO_LOG", "warn")
        .output()
        .expect("spawn cartorio")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn import_fixture(data_dir: &Path) {
    let rows = data_dir.join("documents.json");
    std::fs::write(
        &rows,
        r#"[
            {"id": "0123456789abcdef", "name": "Escritura.pdf", "status": "Concluído",
             "content": "ESCRITURA PÚBLICA DE COMPRA E VENDA."},
            {"id": "0124aaaaaaaaaaaa", "name": "Procuracao.docx"}
        ]"#,
    )
    .unwrap();
    let out = run(data_dir, &["docs", "import", rows.to_str().unwrap()]);
    assert!(out.status.success(), "{out:?}");
}

#[test]
fn listed_short_ids_can_be_shown_and_deleted() {
    let tmp = tempfile::tempdir().unwrap();
    import_fixture(tmp.path());

    let list = run(tmp.path(), &["docs", "list"]);
    assert!(stdout(&list).contains("#012345 [Concluído] Escritura.pdf"));

    for reference in ["012345", "#012345", "0123456789abcdef"] {
        let show = run(tmp.path(), &["docs", "show", reference]);
        assert!(show.status.success(), "show {reference}: {show:?}");
        assert!(stdout(&show).contains("id: 0123456789abcdef"));
    }

    let ambiguous = run(tmp.path(), &["docs", "show", "#012"]);
    assert!(!ambiguous.status.success());

    let delete = run(tmp.path(), &["docs", "delete", "012345"]);
    assert!(delete.status.success(), "{delete:?}");
    assert!(!run(tmp.path(), &["docs", "show", "012345"]).status.success());
    assert!(run(tmp.path(), &["docs", "show", "#0124"]).status.success());
}

#[test]
fn storage_bucket_setting_redirects_uploads() {
    let tmp = tempfile::tempdir().unwrap();

    let get = run(tmp.path(), &["config", "get", "storage_bucket"]);
    assert_eq!(stdout(&get).trim(), "documentos");

    let set = run(tmp.path(), &["config", "set", "storage_bucket", "arquivo"]);
    assert!(set.status.success(), "{set:?}");
    let get = run(tmp.path(), &["config", "get", "storage_bucket"]);
    assert_eq!(stdout(&get).trim(), "arquivo");

    let bad = run(tmp.path(), &["config", "set", "storage_bucket", "../fora"]);
    assert!(!bad.status.success());

    let status = run(tmp.path(), &["status", "--json"]);
    let value: serde_json::Value =
        serde_json::from_str(stdout(&status).trim()).unwrap();
    assert_eq!(value["bucket"], "arquivo");

    let file = tmp.path().join("certidao.txt");
    std::fs::write(&file, "CERTIDÃO DE NASCIMENTO").unwrap();
    let upload = run(tmp.path(), &["docs", "upload", file.to_str().unwrap()]);
    assert!(upload.status.success(), "{upload:?}");

    let bucket_dir = tmp.path().join("storage").join("arquivo");
    let stored = std::fs::read_dir(&bucket_dir).unwrap().count();
    assert_eq!(stored, 1);

    let unset = run(tmp.path(), &["config", "unset", "storage_bucket"]);
    assert!(unset.status.success());
    let get = run(tmp.path(), &["config", "get", "storage_bucket"]);
    assert_eq!(stdout(&get).trim(), "documentos");
}

fn cartorio_bin() -> PathBuf {
    if let Some(bin) = option_env!("CARGO_BIN_EXE_cartorio") {
        return PathBuf::from(bin);
    }
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_cartorio") {
        return PathBuf::from(bin);
    }

    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("cartorio");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}
