//! Release commits pushed to a real bare remote.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, Signature};
use shipmate_git::{Credentials, Edit, LocalWorkspace, PushOutcome, Workspace, prepare, publish};
use tempfile::TempDir;

const BRANCH: &str = "release-1.1.0";
const MESSAGE: &str = "release: update files for version 1.1.0";

/// A bare remote whose `main` holds an annotated README.
fn seeded_remote(temp: &TempDir) -> PathBuf {
    let remote = temp.path().join("remote.git");
    Repository::init_bare(&remote).unwrap();

    let seed_dir = temp.path().join("seed");
    let seed = Repository::init(&seed_dir).unwrap();
    fs::write(seed_dir.join("README.md"), "app 1.0.0 # x-shipmate-version\n").unwrap();
    let mut index = seed.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();
    let tree = seed.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Seed", "seed@example.com").unwrap();
    seed.commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
        .unwrap();

    let head = seed.head().unwrap().shorthand().unwrap().to_string();
    seed.remote("origin", remote.to_str().unwrap())
        .unwrap()
        .push(&[format!("refs/heads/{head}:refs/heads/main").as_str()], None)
        .unwrap();
    Repository::open_bare(&remote)
        .unwrap()
        .set_head("refs/heads/main")
        .unwrap();
    remote
}

fn clone(remote: &Path, dir: PathBuf) -> LocalWorkspace {
    LocalWorkspace::clone_into(remote.to_str().unwrap(), dir, Credentials::default()).unwrap()
}

fn edits() -> Vec<Edit> {
    vec![
        Edit::Write {
            path: PathBuf::from(".shipmate-manifest.json"),
            contents: "{\n  \"version\": \"1.1.0\"\n}\n".into(),
        },
        Edit::Annotations {
            path: PathBuf::from("README.md"),
            version: "1.1.0".into(),
        },
    ]
}

fn remote_tip(remote: &Path) -> git2::Oid {
    Repository::open_bare(remote)
        .unwrap()
        .find_reference(&format!("refs/heads/{BRANCH}"))
        .unwrap()
        .target()
        .unwrap()
}

fn blob_text(repo: &Repository, tree: &git2::Tree<'_>, name: &str) -> String {
    let entry = tree.get_name(name).unwrap();
    let blob = repo.find_blob(entry.id()).unwrap();
    String::from_utf8(blob.content().to_vec()).unwrap()
}

#[test]
fn test_conflict_keeps_release_changes_on_remote() {
    let temp = TempDir::new().unwrap();
    let remote = seeded_remote(&temp);
    let mut ours = clone(&remote, temp.path().join("ours"));
    let prepared = prepare(&mut ours, BRANCH, &edits()).unwrap();

    let mut theirs = clone(&remote, temp.path().join("theirs"));
    theirs.checkout_branch(BRANCH).unwrap();
    fs::write(theirs.root().join("NOTES.md"), "other work\n").unwrap();
    theirs.stage(&[PathBuf::from("NOTES.md")]).unwrap();
    theirs.commit("other work").unwrap().unwrap();
    theirs.push(BRANCH, false).unwrap();

    let published = publish(&mut ours, &prepared, MESSAGE).unwrap().unwrap();

    assert!(matches!(published.push, PushOutcome::Recovered { .. }));
    let tip = remote_tip(&remote);
    assert_eq!(published.commit, tip.to_string());

    let bare = Repository::open_bare(&remote).unwrap();
    let commit = bare.find_commit(tip).unwrap();
    assert_eq!(commit.message(), Some(MESSAGE));
    assert_eq!(commit.parent(0).unwrap().message(), Some("other work"));

    let tree = commit.tree().unwrap();
    assert!(tree.get_name("NOTES.md").is_some());
    assert!(blob_text(&bare, &tree, ".shipmate-manifest.json").contains("1.1.0"));
    assert_eq!(
        blob_text(&bare, &tree, "README.md"),
        "app 1.1.0 # x-shipmate-version\n"
    );
}

#[test]
fn test_rerun_with_same_changes_leaves_remote_alone() {
    let temp = TempDir::new().unwrap();
    let remote = seeded_remote(&temp);
    let mut ws = clone(&remote, temp.path().join("work"));

    let prepared = prepare(&mut ws, BRANCH, &edits()).unwrap();
    let first = publish(&mut ws, &prepared, MESSAGE).unwrap().unwrap();
    assert_eq!(first.push, PushOutcome::Pushed);
    let tip = remote_tip(&remote);

    let prepared = prepare(&mut ws, BRANCH, &edits()).unwrap();
    assert!(publish(&mut ws, &prepared, MESSAGE).unwrap().is_none());
    assert_eq!(remote_tip(&remote), tip);

    let mut fresh = clone(&remote, temp.path().join("fresh"));
    let prepared = prepare(&mut fresh, BRANCH, &edits()).unwrap();
    assert!(publish(&mut fresh, &prepared, MESSAGE).unwrap().is_none());
    assert_eq!(remote_tip(&remote), tip);
}
