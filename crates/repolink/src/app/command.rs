//! The copy-link command and the host capabilities it depends on.

use std::fs;
use std::path::Path;

use crate::app::link::{LinkBuilder, LinkOptions, ProviderDetector, revision_token};
use crate::app::selection::{SelectionResolver, caret_range};
use crate::domain::errors::{LinkError, LinkResult};
use crate::domain::model::{ActiveDocument, GeneratedLink, SelectionRange};
use crate::infra::config::Config;
use crate::infra::git::RepoInspector;
use crate::infra::process::{ProcessRunner, SystemProcessRunner};

pub const COPIED_MESSAGE: &str = "Link copied to clipboard.";
pub const GENERATED_MESSAGE: &str = "Link generated.";

/// Supplies the document the user is looking at, if any.
pub trait ActiveFileSource {
    fn active_document(&self) -> LinkResult<Option<ActiveDocument>>;
}

/// Receives the finished link.
pub trait ClipboardSink {
    fn copy(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Status messages shown to the user.
pub trait NotificationSink {
    fn notify(&mut self, message: &str);

    fn report(&mut self, error: &LinkError) {
        self.notify(&user_message(error));
    }
}

/// One-line explanation of `error` suitable for a status bar.
pub fn user_message(error: &LinkError) -> String {
    match error {
        LinkError::NoActiveFile => "Open a file to copy a link to it.".to_owned(),
        LinkError::ReadDocument { path, source } => {
            format!("Could not read {}: {source}", path.display())
        }
        LinkError::NotAGitRepository { directory, .. } => {
            format!("{} is not inside a git repository.", directory.display())
        }
        LinkError::NoUpstreamConfigured { .. } => {
            "The current branch has no upstream. Push it or set one with `git branch --set-upstream-to`."
                .to_owned()
        }
        LinkError::MissingRemoteUrl { remote } => {
            format!("Remote `{remote}` has no URL configured.")
        }
        LinkError::UnsupportedHost { url } => {
            format!("Only GitHub and Azure DevOps remotes are supported, not `{url}`.")
        }
        LinkError::ProcessExecutionFailure { command, detail } => {
            format!("Running `{command}` failed: {detail}")
        }
        LinkError::Clipboard(detail) => format!("Could not copy the link: {detail}"),
    }
}

/// Resolves the active document to a provider link and hands it to the host.
pub struct CommandHandler<R: ProcessRunner = SystemProcessRunner> {
    inspector: RepoInspector<R>,
    builder: LinkBuilder,
}

impl CommandHandler<SystemProcessRunner> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RepoInspector::new(
                SystemProcessRunner,
                config.git.binary.clone(),
                ProviderDetector::from_config(config),
            ),
            LinkBuilder::new(LinkOptions::from_config(config)),
        )
    }
}

impl<R: ProcessRunner> CommandHandler<R> {
    pub fn new(inspector: RepoInspector<R>, builder: LinkBuilder) -> Self {
        Self { inspector, builder }
    }

    #[cfg(test)]
    pub(crate) fn inspector(&self) -> &RepoInspector<R> {
        &self.inspector
    }

    /// Generate the link, copy it when a clipboard is supplied, and notify the user.
    ///
    /// On failure nothing is copied and the error is reported before being returned.
    pub fn execute(
        &self,
        source: &dyn ActiveFileSource,
        clipboard: Option<&mut dyn ClipboardSink>,
        notifier: &mut dyn NotificationSink,
    ) -> LinkResult<GeneratedLink> {
        let outcome = self.generate(source).and_then(|link| {
            let message = match clipboard {
                Some(sink) => {
                    sink.copy(&link.url)
                        .map_err(|err| LinkError::Clipboard(format!("{err:#}")))?;
                    COPIED_MESSAGE
                }
                None => GENERATED_MESSAGE,
            };
            Ok((link, message))
        });

        match outcome {
            Ok((link, message)) => {
                notifier.notify(message);
                Ok(link)
            }
            Err(err) => {
                tracing::debug!(error = %err, "link command aborted");
                notifier.report(&err);
                Err(err)
            }
        }
    }

    /// Build the link for the active document without touching any sink.
    pub fn generate(&self, source: &dyn ActiveFileSource) -> LinkResult<GeneratedLink> {
        let document = source.active_document()?.ok_or(LinkError::NoActiveFile)?;
        let file_name = document
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(LinkError::NoActiveFile)?;
        let directory = document
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let context = self.inspector.inspect(directory)?;
        let location = context.locate(&file_name);
        let selection = resolve_selection(&document)?;
        let commit = context.head_commit.as_deref().unwrap_or_default();

        let url = self.builder.build(
            context.provider,
            &context.remote_url,
            &context.branch_name,
            commit,
            &location.repo_relative_path,
            &selection,
        )?;
        tracing::info!(%url, provider = %context.provider, "generated link");

        Ok(GeneratedLink {
            revision: revision_token(context.provider, &context.branch_name, commit)
                .unwrap_or_default(),
            url,
            provider: context.provider,
            path: location.repo_relative_path,
            selection,
        })
    }
}

fn resolve_selection(document: &ActiveDocument) -> LinkResult<SelectionRange> {
    let Some(span) = document.selection.filter(|span| !span.is_empty()) else {
        return Ok(caret_range(document.caret));
    };
    let resolver = match &document.text {
        Some(text) => SelectionResolver::new(text),
        None => {
            let text = fs::read_to_string(&document.path).map_err(|source| {
                LinkError::ReadDocument {
                    path: document.path.clone(),
                    source,
                }
            })?;
            SelectionResolver::new(&text)
        }
    };
    Ok(resolver.resolve(document.caret, Some(span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    use anyhow::anyhow;

    use crate::domain::model::{Caret, Provider, SelectionSpan};
    use crate::infra::process::ProcessOutput;

    /// Answers git queries from a fixed table keyed by argument string.
    struct FakeGit {
        answers: HashMap<String, ProcessOutput>,
        queries: RefCell<Vec<String>>,
    }

    impl FakeGit {
        fn repo(upstream: &str, url: &str, prefix: &str, head: &str) -> Self {
            let mut answers = HashMap::new();
            answers.insert("rev-parse --git-dir".to_owned(), ok(".git"));
            answers.insert(
                "rev-parse --abbrev-ref --symbolic-full-name @{upstream}".to_owned(),
                ok(upstream),
            );
            let remote = upstream.split('/').next().unwrap_or_default();
            answers.insert(format!("config --get remote.{remote}.url"), ok(url));
            answers.insert("rev-parse --show-prefix".to_owned(), ok(prefix));
            answers.insert("rev-parse HEAD".to_owned(), ok(head));
            Self {
                answers,
                queries: RefCell::default(),
            }
        }

        fn outside_repo() -> Self {
            let mut answers = HashMap::new();
            answers.insert(
                "rev-parse --git-dir".to_owned(),
                ProcessOutput {
                    status: Some(128),
                    stdout: String::new(),
                    stderr: "fatal: not a git repository".to_owned(),
                },
            );
            Self {
                answers,
                queries: RefCell::default(),
            }
        }
    }

    impl ProcessRunner for FakeGit {
        fn run(&self, _program: &str, args: &[&str], _cwd: &Path) -> io::Result<ProcessOutput> {
            let key = args.join(" ");
            self.queries.borrow_mut().push(key.clone());
            self.answers
                .get(&key)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, format!("unexpected query {key}")))
        }
    }

    fn ok(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            status: Some(0),
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    struct StaticSource(Option<ActiveDocument>);

    impl ActiveFileSource for StaticSource {
        fn active_document(&self) -> LinkResult<Option<ActiveDocument>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        contents: Option<String>,
        fail: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn copy(&mut self, text: &str) -> anyhow::Result<()> {
            if self.fail {
                return Err(anyhow!("clipboard is locked"));
            }
            self.contents = Some(text.to_owned());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Vec<String>,
    }

    impl NotificationSink for RecordingNotifier {
        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_owned());
        }
    }

    fn handler(git: FakeGit) -> CommandHandler<FakeGit> {
        CommandHandler::new(
            RepoInspector::new(git, "git", ProviderDetector::default()),
            LinkBuilder::default(),
        )
    }

    fn document(path: &str, line: usize) -> ActiveDocument {
        ActiveDocument {
            path: PathBuf::from(path),
            caret: Caret { line, column: 0 },
            selection: None,
            text: None,
        }
    }

    #[test]
    fn copies_github_permalink_for_caret_line() {
        let handler = handler(FakeGit::repo(
            "origin/main",
            "https://github.com/acme/widgets.git",
            "src/app/",
            "abc123",
        ));
        let source = StaticSource(Some(document("/work/widgets/src/app/main.go", 9)));
        let mut clipboard = RecordingClipboard::default();
        let mut notifier = RecordingNotifier::default();

        let link = handler
            .execute(&source, Some(&mut clipboard), &mut notifier)
            .unwrap();

        let expected = "https://github.com/acme/widgets/blob/abc123/src/app/main.go#L10";
        assert_eq!(link.url, expected);
        assert_eq!(link.provider, Provider::GitHubLike);
        assert_eq!(link.revision, "abc123");
        assert_eq!(link.path, "src/app/main.go");
        assert_eq!(clipboard.contents.as_deref(), Some(expected));
        assert_eq!(notifier.messages, vec![COPIED_MESSAGE]);
    }

    #[test]
    fn devops_link_uses_selection_columns() {
        let handler = handler(FakeGit::repo(
            "origin/feature/login",
            "https://acme.visualstudio.com/Web/_git/portal",
            "",
            "unused",
        ));
        let text = "first line\nsecond line\nthird\n";
        let mut doc = document("/work/portal/README.md", 0);
        doc.selection = Some(SelectionSpan { start: 6, end: 17 });
        doc.text = Some(text.to_owned());

        let mut notifier = RecordingNotifier::default();
        let link = handler
            .execute(&StaticSource(Some(doc)), None, &mut notifier)
            .unwrap();

        assert_eq!(
            link.url,
            "https://acme.visualstudio.com/Web/_git/portal?path=/README.md&version=GBfeature/login&line=1&lineEnd=2&lineStartColumn=7&lineEndColumn=7"
        );
        assert_eq!(link.revision, "GBfeature/login");
        let queries = handler.inspector().runner().queries.borrow();
        assert!(!queries.iter().any(|query| query == "rev-parse HEAD"));
        assert_eq!(notifier.messages, vec![GENERATED_MESSAGE]);
    }

    #[test]
    fn missing_document_reports_and_skips_clipboard() {
        let handler = handler(FakeGit::outside_repo());
        let mut clipboard = RecordingClipboard::default();
        let mut notifier = RecordingNotifier::default();

        let err = handler
            .execute(&StaticSource(None), Some(&mut clipboard), &mut notifier)
            .unwrap_err();

        assert!(matches!(err, LinkError::NoActiveFile));
        assert!(clipboard.contents.is_none());
        assert_eq!(notifier.messages, vec![user_message(&LinkError::NoActiveFile)]);
        assert!(handler.inspector().runner().queries.borrow().is_empty());
    }

    #[test]
    fn outside_repository_leaves_clipboard_untouched() {
        let handler = handler(FakeGit::outside_repo());
        let mut clipboard = RecordingClipboard::default();
        let mut notifier = RecordingNotifier::default();

        let err = handler
            .execute(
                &StaticSource(Some(document("/tmp/notes/todo.txt", 0))),
                Some(&mut clipboard),
                &mut notifier,
            )
            .unwrap_err();

        assert!(matches!(err, LinkError::NotAGitRepository { .. }));
        assert!(clipboard.contents.is_none());
        assert_eq!(notifier.messages.len(), 1);
        assert!(notifier.messages[0].contains("not inside a git repository"));
    }

    #[test]
    fn unsupported_host_is_reported() {
        let handler = handler(FakeGit::repo(
            "origin/main",
            "https://gitlab.com/acme/widgets.git",
            "",
            "abc123",
        ));
        let mut clipboard = RecordingClipboard::default();
        let mut notifier = RecordingNotifier::default();

        let err = handler
            .execute(
                &StaticSource(Some(document("/work/widgets/lib.rs", 0))),
                Some(&mut clipboard),
                &mut notifier,
            )
            .unwrap_err();

        assert!(matches!(err, LinkError::UnsupportedHost { .. }));
        assert!(clipboard.contents.is_none());
        assert!(notifier.messages[0].contains("gitlab.com"));
    }

    #[test]
    fn clipboard_failure_is_reported() {
        let handler = handler(FakeGit::repo(
            "origin/main",
            "https://github.com/acme/widgets",
            "",
            "abc123",
        ));
        let mut clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let mut notifier = RecordingNotifier::default();

        let err = handler
            .execute(
                &StaticSource(Some(document("/work/widgets/lib.rs", 0))),
                Some(&mut clipboard),
                &mut notifier,
            )
            .unwrap_err();

        assert!(matches!(err, LinkError::Clipboard(ref detail) if detail.contains("locked")));
        assert_eq!(notifier.messages.len(), 1);
    }

    #[test]
    fn selection_without_text_reads_the_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lib.rs");
        fs::write(&path, "one\ntwo\nthree\n")?;

        let handler = handler(FakeGit::repo(
            "origin/main",
            "https://github.com/acme/widgets",
            "",
            "abc123",
        ));
        let doc = ActiveDocument {
            path,
            caret: Caret::default(),
            selection: Some(SelectionSpan { start: 4, end: 9 }),
            text: None,
        };

        let link = handler.generate(&StaticSource(Some(doc)))?;
        assert_eq!(link.url, "https://github.com/acme/widgets/blob/abc123/lib.rs#L2");
        assert_eq!((link.selection.start_line, link.selection.end_line), (2, 3));
        Ok(())
    }

    #[test]
    fn every_error_kind_has_a_distinct_message() {
        let errors = [
            LinkError::NoActiveFile,
            LinkError::NotAGitRepository {
                directory: PathBuf::from("/tmp"),
                detail: String::new(),
            },
            LinkError::NoUpstreamConfigured {
                detail: String::new(),
            },
            LinkError::MissingRemoteUrl {
                remote: "origin".into(),
            },
            LinkError::UnsupportedHost {
                url: "https://example.com".into(),
            },
            LinkError::ProcessExecutionFailure {
                command: "git rev-parse HEAD".into(),
                detail: "boom".into(),
            },
            LinkError::Clipboard("busy".into()),
        ];
        let mut messages: Vec<String> = errors.iter().map(user_message).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }
}
