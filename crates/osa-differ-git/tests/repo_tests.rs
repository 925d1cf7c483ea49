use std::fs;
use std::path::Path;

use git2::{Commit, Oid, Repository, Signature};
use osa_differ_git::{GitError, GitRepo, RangeCheck};
use tempfile::TempDir;

/// Helper: write a file, stage it and commit on HEAD.
fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    let path = workdir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parents: Vec<Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Helper: repository with `count` sequential commits named "Commit #N".
fn repo_with_commits(count: usize) -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    for x in 0..count {
        commit_file(&repo, &format!("test{}.txt", x), "Test", &format!("Commit #{}", x));
    }
    (dir, repo)
}

/// Helper: commit a side branch off HEAD and merge it back in.
fn merge_side_branch(repo: &Repository, name: &str) -> Oid {
    let sig = Signature::now("Test", "test@example.com").unwrap();
    let base = repo.head().unwrap().peel_to_commit().unwrap();

    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), "side").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let side_id = repo
        .commit(None, &sig, &sig, &format!("Side {}", name), &tree, &[&base])
        .unwrap();
    let side = repo.find_commit(side_id).unwrap();

    repo.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &format!("Merge {}", name),
        &tree,
        &[&base, &side],
    )
    .unwrap()
}

// ============================================================
// list_commits
// ============================================================

#[test]
fn test_list_commits_last_two() {
    let (dir, _repo) = repo_with_commits(10);
    let repo = GitRepo::open(dir.path()).unwrap();

    let commits: Vec<_> = repo
        .list_commits("HEAD~2", "HEAD", false)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].subject, "Commit #9");
    assert_eq!(commits[1].subject, "Commit #8");
    assert!(commits.iter().all(|c| !c.is_merge));
    assert_eq!(commits[0].author, "Test");
}

#[test]
fn test_list_commits_count_matches_distance() {
    let (dir, _repo) = repo_with_commits(10);
    let repo = GitRepo::open(dir.path()).unwrap();

    for distance in 1..10 {
        let old = format!("HEAD~{}", distance);
        let count = repo.list_commits(&old, "HEAD", false).unwrap().count();
        assert_eq!(count, distance);
    }
}

#[test]
fn test_list_commits_is_restartable() {
    let (dir, _repo) = repo_with_commits(5);
    let repo = GitRepo::open(dir.path()).unwrap();

    let first: Vec<String> = repo
        .list_commits("HEAD~3", "HEAD", false)
        .unwrap()
        .map(|c| c.unwrap().sha)
        .collect();
    let second: Vec<String> = repo
        .list_commits("HEAD~3", "HEAD", false)
        .unwrap()
        .map(|c| c.unwrap().sha)
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_hide_merges_only_removes_merges() {
    let (dir, raw) = repo_with_commits(2);
    let base = raw.head().unwrap().target().unwrap().to_string();
    merge_side_branch(&raw, "side-a.txt");
    commit_file(&raw, "after.txt", "after", "After merge");
    merge_side_branch(&raw, "side-b.txt");

    let repo = GitRepo::open(dir.path()).unwrap();

    let all: Vec<_> = repo
        .list_commits(&base, "HEAD", false)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let hidden: Vec<_> = repo
        .list_commits(&base, "HEAD", true)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let merges = all.iter().filter(|c| c.is_merge).count();
    assert_eq!(all.len(), 5);
    assert_eq!(merges, 2);
    assert_eq!(hidden.len(), all.len() - merges);
    assert!(hidden.iter().all(|c| !c.is_merge));
    assert!(hidden.iter().all(|c| all.contains(c)));
}

#[test]
fn test_hide_merges_keeps_merge_named_commits() {
    // Only parent count decides what a merge is, not the subject line
    let dir = TempDir::new().unwrap();
    let raw = Repository::init(dir.path()).unwrap();
    for x in 0..10 {
        commit_file(&raw, &format!("test{}.txt", x), "Test", &format!("Merge #{}", x));
    }

    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(repo.list_commits("HEAD~2", "HEAD", true).unwrap().count(), 2);
    assert_eq!(repo.list_commits("HEAD~2", "HEAD", false).unwrap().count(), 2);
}

// ============================================================
// validate_ref / validate_range
// ============================================================

#[test]
fn test_validate_ref_valid() {
    let (dir, _repo) = repo_with_commits(1);
    let repo = GitRepo::open(dir.path()).unwrap();

    assert!(repo.validate_ref("HEAD").is_ok());
}

#[test]
fn test_validate_ref_missing_ancestor() {
    let (dir, _repo) = repo_with_commits(1);
    let repo = GitRepo::open(dir.path()).unwrap();

    let result = repo.validate_ref("HEAD~1");
    assert!(matches!(result, Err(GitError::InvalidReference(r)) if r == "HEAD~1"));
}

#[test]
fn test_validate_ref_unknown_sha() {
    let (dir, _repo) = repo_with_commits(1);
    let repo = GitRepo::open(dir.path()).unwrap();

    assert!(repo
        .validate_ref("0000000000000000000000000000000000000001")
        .is_err());
}

#[test]
fn test_validate_range_forward() {
    let (dir, _repo) = repo_with_commits(3);
    let repo = GitRepo::open(dir.path()).unwrap();

    assert_eq!(
        repo.validate_range("HEAD~2", "HEAD").unwrap(),
        RangeCheck::Valid
    );
}

#[test]
fn test_validate_range_flip() {
    let (dir, _repo) = repo_with_commits(3);
    let repo = GitRepo::open(dir.path()).unwrap();

    assert_eq!(
        repo.validate_range("HEAD", "HEAD~2").unwrap(),
        RangeCheck::Flip
    );
}

#[test]
fn test_validate_range_same_commit() {
    let (dir, _repo) = repo_with_commits(3);
    let repo = GitRepo::open(dir.path()).unwrap();

    let result = repo.validate_range("HEAD", "HEAD");
    assert!(matches!(result, Err(GitError::InvalidRange { .. })));
}

#[test]
fn test_validate_range_flip_across_merge() {
    let (dir, raw) = repo_with_commits(2);
    let before = raw.head().unwrap().target().unwrap().to_string();
    merge_side_branch(&raw, "side.txt");

    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(
        repo.validate_range("HEAD", &before).unwrap(),
        RangeCheck::Flip
    );
}

// ============================================================
// read_file_at / list_files_at
// ============================================================

#[test]
fn test_read_file_at_older_commit() {
    let dir = TempDir::new().unwrap();
    let raw = Repository::init(dir.path()).unwrap();
    commit_file(&raw, "pins.yml", "version: 1\n", "First");
    commit_file(&raw, "pins.yml", "version: 2\n", "Second");

    let repo = GitRepo::open(dir.path()).unwrap();
    let old = repo.read_file_at("HEAD~1", Path::new("pins.yml")).unwrap();
    let new = repo.read_file_at("HEAD", Path::new("pins.yml")).unwrap();

    assert_eq!(old.as_deref(), Some("version: 1\n"));
    assert_eq!(new.as_deref(), Some("version: 2\n"));

    // Working tree still holds the newest content
    let on_disk = fs::read_to_string(dir.path().join("pins.yml")).unwrap();
    assert_eq!(on_disk, "version: 2\n");
}

#[test]
fn test_read_file_at_absent_file() {
    let (dir, _repo) = repo_with_commits(1);
    let repo = GitRepo::open(dir.path()).unwrap();

    let content = repo
        .read_file_at("HEAD", Path::new("ansible-role-requirements.yml"))
        .unwrap();
    assert!(content.is_none());
}

#[test]
fn test_list_files_at() {
    let dir = TempDir::new().unwrap();
    let raw = Repository::init(dir.path()).unwrap();
    commit_file(&raw, "defaults/b.yml", "b: 1\n", "Add b");
    commit_file(&raw, "defaults/a.yml", "a: 1\n", "Add a");
    commit_file(&raw, "other/c.yml", "c: 1\n", "Add c");

    let repo = GitRepo::open(dir.path()).unwrap();
    let files = repo.list_files_at("HEAD", Path::new("defaults")).unwrap();
    assert_eq!(
        files,
        vec![
            Path::new("defaults/a.yml").to_path_buf(),
            Path::new("defaults/b.yml").to_path_buf()
        ]
    );

    let older = repo.list_files_at("HEAD~2", Path::new("defaults")).unwrap();
    assert_eq!(older.len(), 1);

    let missing = repo.list_files_at("HEAD", Path::new("nowhere")).unwrap();
    assert!(missing.is_empty());
}

// ============================================================
// update / clone
// ============================================================

#[test]
fn test_update_clones_missing_repo() {
    let (source, _raw) = repo_with_commits(3);
    let storage = TempDir::new().unwrap();
    let dest = storage.path().join("nested").join("test");

    let repo = GitRepo::update(&dest, source.path().to_str().unwrap(), true).unwrap();

    assert_eq!(repo.path(), dest.as_path());
    assert_eq!(repo.list_commits("HEAD~2", "HEAD", false).unwrap().count(), 2);
}

#[test]
fn test_update_opens_existing_repo_without_fetch() {
    let (dir, _raw) = repo_with_commits(2);

    let repo = GitRepo::update(dir.path(), "http://example.invalid/repo", false).unwrap();
    assert!(repo.validate_ref("HEAD").is_ok());

    // Second call leaves history unchanged
    let again = GitRepo::update(dir.path(), "http://example.invalid/repo", false).unwrap();
    assert_eq!(
        repo.validate_ref("HEAD").unwrap(),
        again.validate_ref("HEAD").unwrap()
    );
}

#[test]
fn test_update_fetches_new_history() {
    let (source, raw) = repo_with_commits(2);
    let url = source.path().to_str().unwrap().to_string();
    let storage = TempDir::new().unwrap();
    let dest = storage.path().join("test");

    GitRepo::update(&dest, &url, false).unwrap();
    let new_commit = commit_file(&raw, "late.txt", "late", "Late commit").to_string();

    let stale = GitRepo::update(&dest, &url, false).unwrap();
    assert!(stale.validate_ref(&new_commit).is_err());

    let fresh = GitRepo::update(&dest, &url, true).unwrap();
    assert!(fresh.validate_ref(&new_commit).is_ok());
}

#[test]
fn test_update_moves_branch_names_to_fetched_history() {
    let (source, raw) = repo_with_commits(2);
    let url = source.path().to_str().unwrap().to_string();
    let branch = raw.head().unwrap().shorthand().unwrap().to_string();
    let storage = TempDir::new().unwrap();
    let dest = storage.path().join("test");

    let first = GitRepo::update(&dest, &url, true).unwrap();
    let cloned_tip = first.validate_ref(&branch).unwrap();
    drop(first);

    let new_commit = commit_file(&raw, "late.txt", "late", "Late commit");

    let repo = GitRepo::update(&dest, &url, true).unwrap();
    assert_eq!(repo.validate_ref(&branch).unwrap(), new_commit);
    assert_eq!(
        repo.validate_range(&cloned_tip.to_string(), &branch).unwrap(),
        RangeCheck::Valid
    );

    let commits: Vec<_> = repo
        .list_commits(&cloned_tip.to_string(), &branch, false)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].subject, "Late commit");
}

#[test]
fn test_update_fetches_new_tags() {
    let (source, raw) = repo_with_commits(2);
    let url = source.path().to_str().unwrap().to_string();
    let storage = TempDir::new().unwrap();
    let dest = storage.path().join("test");

    GitRepo::update(&dest, &url, true).unwrap();
    let new_commit = commit_file(&raw, "late.txt", "late", "Release");
    let target = raw.find_object(new_commit, None).unwrap();
    raw.tag_lightweight("1.0.0", &target, false).unwrap();

    let repo = GitRepo::update(&dest, &url, true).unwrap();
    assert_eq!(repo.validate_ref("1.0.0").unwrap(), new_commit);
}

#[test]
fn test_clone_unreachable_source() {
    let storage = TempDir::new().unwrap();
    let missing = storage.path().join("does-not-exist");
    let dest = storage.path().join("clone");

    let result = GitRepo::clone_remote(missing.to_str().unwrap(), &dest);
    assert!(matches!(result, Err(GitError::CloneFailed { .. })));
}
