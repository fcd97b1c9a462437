use liv_container::codec::{self, ReadLimits};
use liv_container::{CodecError, PathError, PackageManager};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

fn crafted(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(bytes).expect("write entry");
    }
    zip.finish().expect("finish").into_inner()
}

fn base() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("manifest.json", &br#"{"version":"1.0"}"#[..]),
        ("content/index.html", &b"<html></html>"[..]),
    ]
}

#[test]
fn traversal_entry_is_a_hard_failure() {
    for evil in ["../../etc/cron.d/x", "content/../../x", "assets/..hidden"] {
        let mut entries = base();
        entries.push((evil, b"payload"));
        let bytes = crafted(&entries);

        let err = codec::read_bytes(&bytes, &ReadLimits::default()).expect_err(evil);
        assert!(
            matches!(err, CodecError::Path(PathError::Traversal { .. })),
            "{evil}: {err}"
        );
        assert!(err.to_string().contains(evil));
    }
}

#[test]
fn reserved_characters_and_absolute_names_fail() {
    let cases: [(&str, fn(&PathError) -> bool); 3] = [
        ("/abs/path.txt", |e| matches!(e, PathError::Absolute { .. })),
        ("C:/windows/x.dll", |e| matches!(e, PathError::InvalidCharacter { character: ':', .. })),
        ("content/what?.html", |e| matches!(e, PathError::InvalidCharacter { character: '?', .. })),
    ];
    for (name, check) in cases {
        let mut entries = base();
        entries.push((name, b"x"));
        match codec::read_bytes(&crafted(&entries), &ReadLimits::default()) {
            Err(CodecError::Path(e)) => assert!(check(&e), "{name}: {e}"),
            other => panic!("{name}: expected path error, got {other:?}"),
        }
    }
}

#[test]
fn extraction_never_writes_outside_root() {
    let outer = tempfile::tempdir().expect("tempdir");
    let root = outer.path().join("extract");
    let mut entries = base();
    entries.push(("../escaped.txt", b"gotcha"));

    let err = codec::extract_to_dir(Cursor::new(crafted(&entries)), &root, &ReadLimits::default())
        .expect_err("must refuse");
    assert!(matches!(err, CodecError::Path(_)));
    assert!(!outer.path().join("escaped.txt").exists());
    assert!(!root.join("manifest.json").exists(), "no partial extraction");
}

#[test]
fn overlong_name_is_rejected() {
    let long = format!("assets/data/{}", "a".repeat(260));
    let mut entries: Vec<(&str, &[u8])> = base();
    entries.push((long.as_str(), b"x"));
    let err = codec::read_bytes(&crafted(&entries), &ReadLimits::default()).expect_err("too long");
    assert!(matches!(err, CodecError::Path(PathError::TooLong { max: 260, .. })));
}

#[test]
fn document_reader_propagates_codec_failures() {
    let mut entries = base();
    entries.push(("../x", b"x"));
    let err = PackageManager::default()
        .read_document(Cursor::new(crafted(&entries)))
        .expect_err("must fail");
    assert!(err.to_string().contains("../x"));
}

#[test]
fn zip_bomb_style_expansion_is_bounded() {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("content/index.html", opts).expect("start");
    zip.write_all(&vec![0_u8; 1 << 20]).expect("write");
    let bytes = zip.finish().expect("finish").into_inner();
    assert!(bytes.len() < 1 << 16);

    let limits = ReadLimits {
        max_total_bytes: 1 << 16,
        ..ReadLimits::default()
    };
    match codec::read_bytes(&bytes, &limits) {
        Err(CodecError::LimitExceeded { path, .. }) => assert_eq!(path, "content/index.html"),
        other => panic!("expected limit error, got {other:?}"),
    }
}
