/*
 * This module contains some quality of life structs. Most importantly, it contains the
 * `EvalConfig` struct, which implements the default trait. This config can be passed to the
 * tagged evaluators or to the `evaluate_tagged_corpus_conf` function to simplify their arguments.
*/
use crate::entity::TaggingFormat;
use either::Either as LeftOrRight;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of the tagged evaluators. It implements the default
/// trait.
pub struct EvalConfig {
    /// The `TaggingFormat` of the tags. When `None`, the format is detected from the gold tags with
    /// `TaggingFormat::try_auto_detect`.
    format: Option<TaggingFormat>,
    /// Number of tokens kept on each side of a span in its context.
    context_padding: usize,
    /// Is the prefix (e.g. 'I', 'B', 'U', ...) located at the end of the tags? If so, this
    /// parameter should be `true`.
    suffix: bool,
    /// Can we use multiple cores to align the documents?
    parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self {
            format: None,
            context_padding: 0,
            suffix: false,
            parallel: false,
        }
    }
    pub fn format(&self) -> Option<TaggingFormat> {
        self.format
    }
    pub fn context_padding(&self) -> usize {
        self.context_padding
    }
    pub fn suffix(&self) -> bool {
        self.suffix
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl From<(Option<TaggingFormat>, usize, bool, bool)> for EvalConfig {
    fn from(value: (Option<TaggingFormat>, usize, bool, bool)) -> Self {
        Self {
            format: value.0,
            context_padding: value.1,
            suffix: value.2,
            parallel: value.3,
        }
    }
}

impl From<EvalConfig> for (Option<TaggingFormat>, usize, bool, bool) {
    fn from(value: EvalConfig) -> Self {
        (
            value.format,
            value.context_padding,
            value.suffix,
            value.parallel,
        )
    }
}

impl<Format: Into<TaggingFormat>> From<EvalConfigBuilder<Format>> for EvalConfig {
    fn from(value: EvalConfigBuilder<Format>) -> Self {
        Self {
            format: value.format.either(|f| Some(f.into()), |default| default),
            context_padding: value.context_padding,
            suffix: value.suffix,
            parallel: value.parallel,
        }
    }
}

impl Display for EvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let format = match self.format {
            Some(format) => format.to_string(),
            None => String::from("auto-detected"),
        };
        writeln!(f, "Tagging format: {}", format)?;
        writeln!(f, " Context padding: {}", self.context_padding)?;
        writeln!(f, " Prefix located at the end of the tags: {}", self.suffix)?;
        write!(f, " Using parallel computations: {}", self.parallel)
    }
}

/// Builder with the default type parameter.
pub type DefaultEvalConfigBuilder = EvalConfigBuilder<TaggingFormat>;

/// This builder can be used to build and customize an `EvalConfig` structure.
pub struct EvalConfigBuilder<Format: Into<TaggingFormat>> {
    format: LeftOrRight<Format, Option<TaggingFormat>>,
    context_padding: usize,
    suffix: bool,
    parallel: bool,
}

impl Default for EvalConfigBuilder<TaggingFormat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Format: Into<TaggingFormat>> EvalConfigBuilder<Format> {
    pub fn format(mut self, format: Format) -> Self {
        self.format = LeftOrRight::Left(format);
        self
    }
    /// Detect the format from the gold tags. This is the default.
    pub fn auto_detect(mut self) -> Self {
        self.format = LeftOrRight::Right(None);
        self
    }
    pub fn context_padding(mut self, context_padding: usize) -> Self {
        self.context_padding = context_padding;
        self
    }
    pub fn suffix(mut self, suffix: bool) -> Self {
        self.suffix = suffix;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        Self {
            format: LeftOrRight::Right(None),
            context_padding: 0,
            suffix: false,
            parallel: false,
        }
    }
    pub fn build(self) -> EvalConfig {
        EvalConfig::from(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaggingFormat::IOB)]
    #[case(TaggingFormat::IOB2)]
    #[case(TaggingFormat::BIOES)]
    #[case(TaggingFormat::BILOU)]
    fn test_builder_setters_format(#[case] format: TaggingFormat) {
        let builder = EvalConfigBuilder::default();
        let config = builder.format(format).build();
        assert_eq!(config.format, Some(format));
        let config = EvalConfigBuilder::default()
            .format(format)
            .auto_detect()
            .build();
        assert_eq!(config.format, None);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn test_builder_setters_context_padding(#[case] padding: usize) {
        let config = EvalConfigBuilder::default()
            .context_padding(padding)
            .build();
        assert_eq!(config.context_padding, padding)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let builder = EvalConfigBuilder::default();
        let config = builder.parallel(parallel).build();
        assert_eq!(config.parallel, parallel)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_suffix(#[case] suffix: bool) {
        let builder = EvalConfigBuilder::default();
        let config = builder.suffix(suffix).build();
        assert_eq!(config.suffix, suffix)
    }

    #[test]
    fn test_default_and_tuple_conversion() {
        let config = EvalConfig::default();
        assert_eq!(EvalConfigBuilder::default().build(), config);
        let tuple: (Option<TaggingFormat>, usize, bool, bool) = config.into();
        assert_eq!(tuple, (None, 0, false, false));
        assert_eq!(EvalConfig::from(tuple), config);
    }

    #[test]
    fn test_deserialize() {
        let config: EvalConfig = serde_json::from_str(
            r#"{"format":"BILOU","context_padding":2,"suffix":false,"parallel":true}"#,
        )
        .unwrap();
        assert_eq!(config.format(), Some(TaggingFormat::BILOU));
        assert_eq!(config.context_padding(), 2);
        assert!(config.parallel());
    }
}
