//! Report rendering and the files handed to the external agent.
//!
//! Every `render_*` function is pure: same bundle in, same text out.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::{CommitRecord, ReportBundle};

const TITLE_MAX_CHARS: usize = 60;
const DETAIL_MAX_CHARS: usize = 200;
const SUMMARY_TITLE_MAX_CHARS: usize = 50;
const PROMPT_MAX_FILES: usize = 10;

const SNAPSHOT_FILE_NAME: &str = "github_daily_commits.json";
const PROMPT_FILE_NAME: &str = "github_daily_report_prompt.txt";

/// Destination named in the prompt when none is configured.
pub const DEFAULT_DESTINATION: &str = "\"工作日报\" 数据库";

/// What the agent should do with the day's page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PublishMode {
    /// Find the day's page or create it.
    #[default]
    Create,
    /// Find the day's existing page and add to the end of it.
    Append,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    pub mode: PublishMode,
    /// Notion page or database the agent should write to.
    pub destination: Option<String>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Markdown report: one section per repository, in the order each
/// repository's first commit appears.
pub fn render_markdown(bundle: &ReportBundle) -> String {
    let mut lines = vec![
        format!("# 工作日报 - {}", bundle.date),
        String::new(),
        format!(
            "**今日提交**: {} 个 commits 分布在 {} 个仓库",
            bundle.total_commits,
            bundle.repos_with_commits.len()
        ),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    for repo in bundle.repos_by_first_commit() {
        lines.push(format!("## 📁 {repo}"));
        lines.push(String::new());
        for commit in bundle.commits_for(repo) {
            lines.push(format!(
                "**[{}]** {}",
                commit.sha,
                truncate_chars(commit.title(), TITLE_MAX_CHARS)
            ));
            let detail = commit.body();
            if !detail.is_empty() {
                lines.push(format!("> {}", ellipsize(&detail, DETAIL_MAX_CHARS)));
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Plain-text summary grouped by repository.
pub fn render_summary(bundle: &ReportBundle) -> String {
    let mut out = format!(
        "今日 ({}) 共提交 {} 个 commits，涉及 {} 个项目：\n\n",
        bundle.date,
        bundle.total_commits,
        bundle.repos_with_commits.len()
    );
    for repo in &bundle.repos_with_commits {
        let _ = writeln!(out, "【{repo}】");
        for commit in bundle.commits_for(repo) {
            let _ = writeln!(
                out,
                "  - {}",
                truncate_chars(commit.title(), SUMMARY_TITLE_MAX_CHARS)
            );
        }
        out.push('\n');
    }
    out
}

/// The Markdown report and the summary, as the `report` command prints them.
/// An empty bundle renders as a single no-commits line.
pub fn render_report(bundle: &ReportBundle) -> String {
    if bundle.is_empty() {
        return format!("{}\n", no_commits_notice(&bundle.date));
    }
    format!("{}\n\n{}", render_markdown(bundle), render_summary(bundle))
}

fn no_commits_notice(date: &str) -> String {
    format!("今日 ({date}) 暂无 commits")
}

/// Instructions for an external agent that writes the report into Notion.
pub fn render_agent_prompt(bundle: &ReportBundle, options: &PromptOptions) -> String {
    if bundle.is_empty() {
        return no_commits_notice(&bundle.date);
    }

    let date = &bundle.date;
    let destination = options
        .destination
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DESTINATION);

    let mut out = String::new();
    match options.mode {
        PublishMode::Create => {
            out.push_str("请帮我生成工作日报并推送到 Notion 的指定位置。\n\n");
        }
        PublishMode::Append => {
            out.push_str("请帮我更新工作日报，在已有日报后面追加新的内容。\n\n");
        }
    }
    let _ = writeln!(out, "**日报日期**: {date}");
    let _ = writeln!(out, "**Notion 目标位置**: {destination}");
    out.push('\n');
    let heading = match options.mode {
        PublishMode::Create => "GitHub Commits 详情",
        PublishMode::Append => "新增的 GitHub Commits 详情",
    };
    let _ = writeln!(out, "**{heading}**（共 {} 个）：", bundle.total_commits);
    out.push('\n');

    for commit in &bundle.commits {
        write_commit_block(&mut out, commit);
    }

    match options.mode {
        PublishMode::Create => {
            let _ = write!(
                out,
                "请执行以下操作：

1. 在 Notion 的 {destination} 中，查找标题为 \"工作日报 - {date}\" 的日报
   - 如果已存在，在末尾追加内容
   - 如果不存在，创建新页面，标题为 \"工作日报 - {date}\"

2. 根据以上 commits 生成通俗易懂的工作日报：
   - 用\"人话\"描述工作内容（不要直接复制 commit message）
   - 按项目/仓库分组
   - 说明解决了什么问题、完成了什么功能
   - 突出技术亮点和关键进展

3. 将日报保存到 Notion

请确认并生成日报。
"
            );
        }
        PublishMode::Append => {
            let _ = write!(
                out,
                "请执行以下操作：

1. 在 Notion 的 {destination} 中，查找标题为 \"工作日报 - {date}\" 的日报

2. 找到后，在日报末尾追加内容：
   - 添加分隔线或时间标记（如 \"--- 下午更新 ---\"）
   - 用\"人话\"描述新增的工作内容，按项目/仓库分组
   - 突出技术亮点和关键进展
   - 与已有内容衔接，形成完整的日报

3. 更新 Notion 页面

请确认并更新日报。
"
            );
        }
    }
    out
}

fn write_commit_block(out: &mut String, commit: &CommitRecord) {
    let _ = writeln!(out, "【{}】", commit.repo);
    let _ = writeln!(out, "Commit: {}", commit.sha);
    let _ = writeln!(out, "Message: {}", commit.message.trim_end());
    if let Some(stats) = &commit.stats {
        let _ = writeln!(out, "改动: +{} / -{} 行", stats.additions, stats.deletions);
    }
    if let Some(files) = commit.files.as_deref()
        && !files.is_empty()
    {
        out.push_str("涉及文件:\n");
        for file in files.iter().take(PROMPT_MAX_FILES) {
            let _ = writeln!(
                out,
                "  {} {} ({}行)",
                file.status.glyph(),
                file.filename,
                file.changes
            );
        }
        if files.len() > PROMPT_MAX_FILES {
            let _ = writeln!(out, "  ... 等共 {} 个文件", files.len());
        }
    }
    out.push('\n');
}

/// First `max` characters of `s` (Unicode scalar values, not bytes).
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// `s` cut to `max` characters with `...` appended when it was longer.
fn ellipsize(s: &str, max: usize) -> String {
    let cut = truncate_chars(s, max);
    if cut.len() < s.len() {
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Hand-off files
// ---------------------------------------------------------------------------

pub fn default_snapshot_path() -> PathBuf {
    std::env::temp_dir().join(SNAPSHOT_FILE_NAME)
}

pub fn default_prompt_path() -> PathBuf {
    std::env::temp_dir().join(PROMPT_FILE_NAME)
}

/// Write the bundle as pretty-printed JSON.
pub fn write_snapshot(bundle: &ReportBundle, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(bundle).context("failed to serialize commits")?;
    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("failed to write commit snapshot to {}", path.display()))
}

pub fn write_prompt(text: &str, path: &Path) -> Result<()> {
    std::fs::write(path, text)
        .with_context(|| format!("failed to write prompt to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitStats, FileChange, FileStatus};
    use tempfile::TempDir;

    fn record(repo: &str, sha: &str, time: &str, message: &str) -> CommitRecord {
        CommitRecord {
            sha: sha.to_string(),
            message: message.to_string(),
            repo: repo.to_string(),
            url: String::new(),
            time: time.to_string(),
            stats: None,
            files: None,
        }
    }

    fn scenario_bundle() -> ReportBundle {
        ReportBundle::from_repo_results(
            "2026-02-02",
            vec![
                (
                    "org/a".to_string(),
                    vec![
                        record("org/a", "aaaaaa1", "2026-02-02T05:00:00Z", "feat: one"),
                        record("org/a", "aaaaaa2", "2026-02-02T09:00:00Z", "fix: two"),
                    ],
                ),
                (
                    "org/b".to_string(),
                    vec![
                        record("org/b", "bbbbbb0", "2026-02-02T03:00:00Z", "chore: zero"),
                        record("org/b", "bbbbbb3", "2026-02-02T07:00:00Z", "docs: three"),
                    ],
                ),
            ],
        )
    }

    fn file(name: &str, status: FileStatus) -> FileChange {
        FileChange {
            filename: name.to_string(),
            status,
            additions: 1,
            deletions: 0,
            changes: 1,
        }
    }

    // -------------------------------------------------------------------
    // render_markdown
    // -------------------------------------------------------------------

    #[test]
    fn test_markdown_header_and_totals() {
        let md = render_markdown(&scenario_bundle());
        assert!(md.starts_with("# 工作日报 - 2026-02-02\n\n**今日提交**: 4 个 commits 分布在 2 个仓库\n\n---\n"));
    }

    #[test]
    fn test_markdown_one_heading_per_repo_in_first_seen_order() {
        let md = render_markdown(&scenario_bundle());
        assert_eq!(md.matches("## 📁 org/a").count(), 1);
        assert_eq!(md.matches("## 📁 org/b").count(), 1);
        let b = md.find("## 📁 org/b").unwrap();
        let a = md.find("## 📁 org/a").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_markdown_each_hash_exactly_once() {
        let bundle = scenario_bundle();
        let md = render_markdown(&bundle);
        for c in &bundle.commits {
            assert_eq!(md.matches(&format!("**[{}]**", c.sha)).count(), 1);
        }
    }

    #[test]
    fn test_markdown_truncates_title_and_detail() {
        let title = "t".repeat(100);
        let body = "d".repeat(300);
        let bundle = ReportBundle::from_repo_results(
            "2026-02-02",
            vec![(
                "org/a".to_string(),
                vec![record(
                    "org/a",
                    "abc1234",
                    "2026-02-02T01:00:00Z",
                    &format!("{title}\n\n{body}"),
                )],
            )],
        );
        let md = render_markdown(&bundle);
        assert!(md.contains(&format!("**[abc1234]** {}\n", "t".repeat(60))));
        assert!(md.contains(&format!("> {}...\n", "d".repeat(200))));
        assert!(!md.contains(&"t".repeat(61)));
    }

    #[test]
    fn test_markdown_truncation_counts_characters() {
        let title = "修".repeat(70);
        let bundle = ReportBundle::from_repo_results(
            "2026-02-02",
            vec![(
                "org/a".to_string(),
                vec![record("org/a", "abc1234", "2026-02-02T01:00:00Z", &title)],
            )],
        );
        let md = render_markdown(&bundle);
        assert!(md.contains(&format!("**[abc1234]** {}\n", "修".repeat(60))));
    }

    #[test]
    fn test_markdown_short_detail_has_no_ellipsis() {
        let bundle = ReportBundle::from_repo_results(
            "2026-02-02",
            vec![(
                "org/a".to_string(),
                vec![record("org/a", "abc1234", "t", "title\n\n  short body  \n")],
            )],
        );
        let md = render_markdown(&bundle);
        assert!(md.contains("> short body\n"));
        assert!(!md.contains("short body..."));
    }

    #[test]
    fn test_markdown_no_detail_line_for_single_line_message() {
        let md = render_markdown(&scenario_bundle());
        assert!(!md.contains("> "));
    }

    // -------------------------------------------------------------------
    // render_summary
    // -------------------------------------------------------------------

    #[test]
    fn test_summary_groups_in_bundle_repo_order() {
        let summary = render_summary(&scenario_bundle());
        assert_eq!(
            summary,
            "今日 (2026-02-02) 共提交 4 个 commits，涉及 2 个项目：\n\n\
             【org/a】\n  - feat: one\n  - fix: two\n\n\
             【org/b】\n  - chore: zero\n  - docs: three\n\n"
        );
    }

    #[test]
    fn test_summary_truncates_to_fifty_chars() {
        let bundle = ReportBundle::from_repo_results(
            "2026-02-02",
            vec![(
                "org/a".to_string(),
                vec![record("org/a", "abc1234", "t", &"x".repeat(80))],
            )],
        );
        let summary = render_summary(&bundle);
        assert!(summary.contains(&format!("  - {}\n", "x".repeat(50))));
        assert!(!summary.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_report_empty_bundle_is_single_notice() {
        let bundle = ReportBundle::from_repo_results("2026-02-02", Vec::new());
        let report = render_report(&bundle);
        assert_eq!(report, "今日 (2026-02-02) 暂无 commits\n");
        assert!(!report.contains("# 工作日报"));
    }

    #[test]
    fn test_report_joins_markdown_and_summary() {
        let bundle = scenario_bundle();
        let report = render_report(&bundle);
        assert!(report.starts_with(&render_markdown(&bundle)));
        assert!(report.ends_with(&render_summary(&bundle)));
    }

    // -------------------------------------------------------------------
    // render_agent_prompt
    // -------------------------------------------------------------------

    #[test]
    fn test_prompt_empty_bundle() {
        let bundle = ReportBundle::from_repo_results("2026-02-02", Vec::new());
        assert_eq!(
            render_agent_prompt(&bundle, &PromptOptions::default()),
            "今日 (2026-02-02) 暂无 commits"
        );
    }

    #[test]
    fn test_prompt_create_mode() {
        let options = PromptOptions {
            mode: PublishMode::Create,
            destination: Some("25-26".to_string()),
        };
        let prompt = render_agent_prompt(&scenario_bundle(), &options);
        assert!(prompt.starts_with("请帮我生成工作日报"));
        assert!(prompt.contains("**日报日期**: 2026-02-02"));
        assert!(prompt.contains("**Notion 目标位置**: 25-26"));
        assert!(prompt.contains("（共 4 个）"));
        assert!(prompt.contains("【org/b】\nCommit: bbbbbb0\nMessage: chore: zero\n"));
        assert!(prompt.contains("如果不存在，创建新页面"));
    }

    #[test]
    fn test_prompt_append_mode_default_destination() {
        let options = PromptOptions {
            mode: PublishMode::Append,
            destination: Some("   ".to_string()),
        };
        let prompt = render_agent_prompt(&scenario_bundle(), &options);
        assert!(prompt.starts_with("请帮我更新工作日报"));
        assert!(prompt.contains(&format!("**Notion 目标位置**: {DEFAULT_DESTINATION}")));
        assert!(prompt.contains("新增的 GitHub Commits 详情"));
        assert!(prompt.contains("在日报末尾追加内容"));
        assert!(!prompt.contains("创建新页面"));
    }

    #[test]
    fn test_prompt_includes_stats_and_caps_files() {
        let mut commit = record("org/a", "abc1234", "2026-02-02T01:00:00Z", "big change");
        let mut files: Vec<FileChange> = (0..12)
            .map(|i| file(&format!("src/f{i}.rs"), FileStatus::Modified))
            .collect();
        files[0] = file("new.rs", FileStatus::Added);
        files[1] = file("gone.rs", FileStatus::Removed);
        files[2] = file("moved.rs", FileStatus::Other);
        commit = commit.with_details(
            CommitStats {
                additions: 40,
                deletions: 7,
                total: 47,
            },
            files,
        );
        let bundle =
            ReportBundle::from_repo_results("2026-02-02", vec![("org/a".into(), vec![commit])]);

        let prompt = render_agent_prompt(&bundle, &PromptOptions::default());
        assert!(prompt.contains("改动: +40 / -7 行\n"));
        assert!(prompt.contains("  + new.rs (1行)\n"));
        assert!(prompt.contains("  - gone.rs (1行)\n"));
        assert!(prompt.contains("  ? moved.rs (1行)\n"));
        assert!(prompt.contains("  ~ src/f9.rs (1行)\n"));
        assert!(!prompt.contains("src/f10.rs"));
        assert!(prompt.contains("  ... 等共 12 个文件\n"));
    }

    #[test]
    fn test_prompt_without_details_has_no_stats_lines() {
        let prompt = render_agent_prompt(&scenario_bundle(), &PromptOptions::default());
        assert!(!prompt.contains("改动:"));
        assert!(!prompt.contains("涉及文件:"));
    }

    // -------------------------------------------------------------------
    // Hand-off files
    // -------------------------------------------------------------------

    #[test]
    fn test_write_snapshot_is_readable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commits.json");
        let bundle = scenario_bundle();
        write_snapshot(&bundle, &path).unwrap();

        let loaded: ReportBundle =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn test_write_prompt_to_missing_dir_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("prompt.txt");
        let err = write_prompt("hello", &path).unwrap_err();
        assert!(err.to_string().contains("prompt.txt"));
    }

    #[test]
    fn test_default_paths_in_temp_dir() {
        assert_eq!(
            default_snapshot_path(),
            std::env::temp_dir().join("github_daily_commits.json")
        );
        assert_eq!(
            default_prompt_path().file_name().unwrap(),
            "github_daily_report_prompt.txt"
        );
    }
}
