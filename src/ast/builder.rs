//! Builds an [`Invocation`] tree from a token stream, re-parsing launcher
//! arguments under the launcher's dialect.

use crate::ast::capture;
use crate::ast::command::{self, CommandWords};
use crate::ast::{Element, Invocation, NestedInvocation};
use crate::dialect::DialectKind;
use crate::error::{Result, TranslationError};
use crate::launchers::{Launch, LauncherRegistry};
use crate::parse::{TokenStream, Word, tokenize_stream};

pub struct Builder<'a> {
    registry: &'a LauncherRegistry,
    max_depth: usize,
    diagnostics: Vec<TranslationError>,
}

impl<'a> Builder<'a> {
    pub fn new(registry: &'a LauncherRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize and build `text` as written for `dialect`.
    pub fn parse(&mut self, text: &str, dialect: DialectKind) -> Result<Invocation> {
        let stream = tokenize_stream(text, dialect.dialect())?;
        self.build(stream, dialect)
    }

    /// Build the invocation tree for an already tokenized command.
    ///
    /// Fails with `NestingTooDeep` when launcher arguments nest deeper than
    /// the configured limit. A nested argument that fails to parse is
    /// recorded as a diagnostic and kept as an ordinary word.
    pub fn build(
        &mut self,
        tokens: impl Into<TokenStream>,
        dialect: DialectKind,
    ) -> Result<Invocation> {
        self.build_at(tokens.into(), dialect, 0, &[])
    }

    /// Non-fatal problems met while building.
    pub fn diagnostics(&self) -> &[TranslationError] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<TranslationError> {
        self.diagnostics
    }

    fn build_at(
        &mut self,
        stream: TokenStream,
        dialect: DialectKind,
        depth: usize,
        path: &[String],
    ) -> Result<Invocation> {
        let TokenStream { tokens, spaced } = stream;
        let mut elements: Vec<Element> = tokens.into_iter().map(Element::from).collect();

        for range in command::split(&elements) {
            let words = CommandWords::collect(&elements, range, dialect);
            let Some(launch) = self.registry.detect(&words.texts) else {
                continue;
            };
            let Some(&index) = words.indices.get(launch.arg) else {
                continue;
            };
            let Element::Word(word) = &elements[index] else {
                continue;
            };
            let nested = self.nest(word, launch, dialect, depth, path)?;
            if let Some(nested) = nested {
                elements[index] = Element::Nested(nested);
            }
        }

        Ok(Invocation {
            dialect,
            elements,
            spaced,
        })
    }

    fn nest(
        &mut self,
        word: &Word,
        launch: Launch,
        outer: DialectKind,
        depth: usize,
        path: &[String],
    ) -> Result<Option<NestedInvocation>> {
        let Some((text, captures)) = capture::argument_text(word, outer.dialect()) else {
            log::debug!(
                "argument of `{}` is not a static string, kept as a plain word",
                launch.label
            );
            return Ok(None);
        };

        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(TranslationError::NestingTooDeep {
                depth,
                max_depth: self.max_depth,
            });
        }

        let mut path = path.to_vec();
        path.push(launch.label.clone());

        let stream = match tokenize_stream(&text, launch.dialect.dialect()) {
            Ok(stream) => stream,
            Err(inner) => {
                log::warn!(
                    "nested command under {} does not parse as {}: {inner}",
                    path.join(" > "),
                    launch.dialect
                );
                self.diagnostics.push(TranslationError::NestedParse {
                    path,
                    inner: Box::new(inner),
                });
                return Ok(None);
            }
        };

        let invocation = self.build_at(stream, launch.dialect, depth, &path)?;
        Ok(Some(NestedInvocation {
            launcher: launch.label,
            dialect: launch.dialect,
            invocation: Box::new(invocation),
            captures,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parse::{Segment, VarRef};

    fn registry() -> LauncherRegistry {
        LauncherRegistry::from_config(&Config::default_config())
    }

    fn nested(invocation: &Invocation) -> Vec<&NestedInvocation> {
        invocation.nested().collect()
    }

    #[test]
    fn plain_command_has_no_nesting() {
        let registry = registry();
        let mut builder = Builder::new(&registry, 8);
        let invocation = builder.parse("ls -la | grep foo", DialectKind::Bash).unwrap();
        assert_eq!(invocation.depth(), 0);
        assert!(builder.diagnostics().is_empty());
    }

    #[test]
    fn bash_c_argument_is_parsed() {
        let registry = registry();
        let mut builder = Builder::new(&registry, 8);
        let invocation = builder
            .parse("bash -c 'echo \"hi\" && ls'", DialectKind::Bash)
            .unwrap();
        let inner = nested(&invocation);
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].launcher, "bash -c");
        assert_eq!(inner[0].dialect, DialectKind::Bash);
        assert_eq!(inner[0].invocation.elements.len(), 4);
    }

    #[test]
    fn ssh_inside_pwsh_nests_twice() {
        let registry = registry();
        let mut builder = Builder::new(&registry, 8);
        let invocation = builder
            .parse(
                "pwsh -Command \"ssh host 'uname -a'\"",
                DialectKind::PowerShell,
            )
            .unwrap();
        assert_eq!(invocation.depth(), 2);
        let ssh = nested(&nested(&invocation)[0].invocation)[0];
        assert_eq!(ssh.launcher, "ssh");
        assert_eq!(ssh.dialect, DialectKind::Bash);
    }

    #[test]
    fn outer_variables_are_captured() {
        let registry = registry();
        let mut builder = Builder::new(&registry, 8);
        let invocation = builder
            .parse("ssh host \"tail -f $LOG\"", DialectKind::Bash)
            .unwrap();
        let ssh = nested(&invocation)[0];
        assert_eq!(
            ssh.captures,
            vec![Segment::VariableRef(VarRef::named("LOG"))]
        );
    }

    #[test]
    fn dynamic_argument_stays_a_word() {
        let registry = registry();
        let mut builder = Builder::new(&registry, 8);
        let invocation = builder.parse("bash -c $CMD", DialectKind::Bash).unwrap();
        assert_eq!(invocation.depth(), 0);
    }

    #[test]
    fn unparseable_nested_argument_is_a_diagnostic() {
        let registry = registry();
        let mut builder = Builder::new(&registry, 8);
        let invocation = builder
            .parse("bash -c \"echo 'oops\"", DialectKind::Bash)
            .unwrap();
        assert_eq!(invocation.depth(), 0);
        let diagnostics = builder.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        match &diagnostics[0] {
            TranslationError::NestedParse { path, inner } => {
                assert_eq!(path, &vec!["bash -c".to_string()]);
                assert_eq!(inner.offset(), Some(5));
            }
            other => panic!("unexpected diagnostic: {other:?}"),
        }
    }

    #[test]
    fn depth_limit_is_enforced() {
        let registry = registry();
        let command = "bash -c \"bash -c 'echo hi'\"";
        let err = Builder::new(&registry, 1)
            .parse(command, DialectKind::Bash)
            .unwrap_err();
        assert_eq!(
            err,
            TranslationError::NestingTooDeep {
                depth: 2,
                max_depth: 1
            }
        );
        let ok = Builder::new(&registry, 2)
            .parse(command, DialectKind::Bash)
            .unwrap();
        assert_eq!(ok.depth(), 2);
    }
}
