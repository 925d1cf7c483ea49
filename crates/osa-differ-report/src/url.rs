//! Repository URL normalization for commit links.

/// Legacy hosts whose repositories are mirrored on GitHub.
///
/// A matching URL keeps only its last two path segments (`org/repo`),
/// appended to the mirror.
const MIRROR_RULES: &[(&str, &str)] = &[("git.openstack.org", "https://github.com")];

const GITHUB_HOST: &str = "github.com";

fn host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split('/').next()?;
    // Drop any userinfo and port
    let authority = authority.rsplit('@').next()?;
    authority.split(':').next()
}

/// URL that commit links should be built from.
///
/// GitHub URLs pass through (minus a trailing `.git`), legacy OpenStack
/// URLs are rewritten to their GitHub mirror, anything else is unchanged.
pub fn commit_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/');
    let Some(host) = host(trimmed) else {
        return repo_url.to_string();
    };

    if host == GITHUB_HOST {
        return trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string();
    }

    for (legacy, mirror) in MIRROR_RULES {
        if host == *legacy {
            let segments: Vec<&str> = trimmed.rsplitn(3, '/').take(2).collect();
            if let &[repo, org] = segments.as_slice() {
                let repo = repo.strip_suffix(".git").unwrap_or(repo);
                return format!("{}/{}/{}", mirror, org, repo);
            }
        }
    }

    repo_url.to_string()
}

/// Link to a single commit
pub fn commit_link(repo_url: &str, sha: &str) -> String {
    format!("{}/commit/{}", commit_url(repo_url), sha)
}
