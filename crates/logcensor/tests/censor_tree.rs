//! End-to-end censoring of a directory tree with secrets from several
//! mounted secret directories.

use std::fs;
use std::path::{Path, PathBuf};

use logcensor::secrets::SecretSet;
use logcensor::{censor_bytes, CensoringConfig, DirectorySecretLoader, Redactor, SecretLoader};

const PREAMBLE: &str = "In my younger and more vulnerable years my father gave me some \
    advice that I\u{2019}ve been turning over in my mind ever since.";

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    secret_dirs: Vec<PathBuf>,
    files: Vec<(PathBuf, Vec<u8>)>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();

    write(&root, "secrets/first/younger", b"younger\n");
    write(&root, "secrets/first/..data/ignored", b"father");
    write(&root, "secrets/second/nested/token", b"my");
    write(&root, "secrets/second/long", b"vulnerable years");

    let contents: Vec<(&str, Vec<u8>)> = vec![
        ("workspace/artifacts/preamble.txt", PREAMBLE.as_bytes().to_vec()),
        ("workspace/artifacts/deep/er/repeated.txt", PREAMBLE.repeat(7).into_bytes()),
        ("workspace/artifacts/clean.txt", b"nothing secret here\n".to_vec()),
        ("workspace/artifacts/empty.txt", Vec::new()),
        ("workspace/artifacts/encoded.txt", b"token: eW91bmdlcg==\n".to_vec()),
        ("workspace/logs/one.log", b"my younger brother\nmymymy\n".to_vec()),
        ("workspace/logs/two.log", b"vulnerable year\nvulnerable years\n".to_vec()),
    ];
    let files = contents
        .into_iter()
        .map(|(name, content)| (write(&root, name, &content), content))
        .collect();

    Fixture {
        secret_dirs: vec![root.join("secrets/first"), root.join("secrets/second")],
        root,
        files,
        _dir: dir,
    }
}

fn read_all(fixture: &Fixture) -> Vec<Vec<u8>> {
    fixture.files.iter().map(|(p, _)| fs::read(p).unwrap()).collect()
}

fn censoring_config(fixture: &Fixture, buffer_size: usize) -> CensoringConfig {
    CensoringConfig {
        targets: vec![
            fixture.root.join("workspace/artifacts"),
            fixture.root.join("workspace/logs/one.log"),
            fixture.root.join("workspace/logs/two.log"),
        ],
        secret_directories: fixture.secret_dirs.clone(),
        include_base64: true,
        buffer_size: Some(buffer_size),
        concurrency: 3,
    }
}

#[tokio::test]
async fn buffer_smaller_than_every_secret_matches_single_pass() {
    let fixture = fixture();
    let loader = DirectorySecretLoader::new().with_base64(true);
    let secrets = SecretSet::new(loader.load(&fixture.secret_dirs).unwrap()).unwrap();

    let redactor = Redactor::with_loader(censoring_config(&fixture, 1), loader);
    let summary = redactor.censor_all().await.unwrap();

    // younger, my, vulnerable years and their base64 forms
    assert_eq!(summary.secrets, 6);
    assert_eq!(summary.files, fixture.files.len());

    for (path, original) in &fixture.files {
        let censored = fs::read(path).unwrap();
        assert_eq!(censored.len(), original.len(), "{}", path.display());
        assert_eq!(censored, censor_bytes(original, &secrets), "{}", path.display());
    }
}

#[tokio::test]
async fn expected_output_for_known_inputs() {
    let fixture = fixture();
    let redactor = Redactor::with_loader(
        censoring_config(&fixture, 1),
        DirectorySecretLoader::new().with_base64(true),
    );
    redactor.censor_all().await.unwrap();

    let read = |name: &str| fs::read_to_string(fixture.root.join(name)).unwrap();
    assert_eq!(read("workspace/logs/one.log"), "** ******* brother\n******\n");
    assert_eq!(
        read("workspace/logs/two.log"),
        "vulnerable year\n****************\n"
    );
    assert_eq!(read("workspace/artifacts/encoded.txt"), "token: ************\n");
    assert_eq!(read("workspace/artifacts/clean.txt"), "nothing secret here\n");
    assert!(read("workspace/artifacts/preamble.txt").contains("** father gave me"));
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let fixture = fixture();
    let config = censoring_config(&fixture, 16);

    Redactor::new(config.clone()).censor_all().await.unwrap();
    let first = read_all(&fixture);

    let summary = Redactor::new(config).censor_all().await.unwrap();
    let second = read_all(&fixture);

    assert_eq!(summary.redactions, 0);
    assert_eq!(first, second);
}

#[tokio::test]
async fn output_is_independent_of_buffer_size() {
    let mut outputs = Vec::new();
    for buffer_size in [1, 2, 7, 16, 500, 100_000] {
        let fixture = fixture();
        Redactor::new(censoring_config(&fixture, buffer_size))
            .censor_all()
            .await
            .unwrap();
        outputs.push(read_all(&fixture));
    }
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}
