use crate::cli::args::HashArgs;
use crate::exit_codes;
use liv_container::{BatchHasher, ContentHasher, PackConfig};
use std::path::PathBuf;

/// `sha256sum`-style output: `<digest>  <path>`, sorted by path.
pub fn run(args: HashArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let workers = args.workers.unwrap_or(config.hash_workers);
    let batch = BatchHasher::new(ContentHasher::default(), workers);

    let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
        args.paths.into_iter().partition(|p| p.is_dir());

    let mut failed = 0_usize;

    match batch.hash_files(&files) {
        Ok(digests) => print_digests(digests.iter().map(|(p, d)| (p.display().to_string(), d))),
        Err(e) => {
            print_digests(e.partial.iter().map(|(p, d)| (p.display().to_string(), d)));
            for f in &e.failures {
                eprintln!("error: {f}");
            }
            failed += e.failures.len();
        }
    }

    for dir in &dirs {
        match batch.hash_directory(dir) {
            Ok(digests) => print_digests(
                digests
                    .iter()
                    .map(|(rel, d)| (dir.join(rel).display().to_string(), d)),
            ),
            Err(e) => {
                print_digests(
                    e.partial
                        .iter()
                        .map(|(rel, d)| (dir.join(rel).display().to_string(), d)),
                );
                for f in &e.failures {
                    eprintln!("error: {f}");
                }
                failed += e.failures.len();
            }
        }
    }

    Ok(if failed == 0 {
        exit_codes::EXIT_SUCCESS
    } else {
        exit_codes::EXIT_INTERNAL_ERROR
    })
}

fn print_digests<'a>(rows: impl Iterator<Item = (String, &'a liv_container::Digest)>) {
    for (path, digest) in rows {
        println!("{digest}  {path}");
    }
}
