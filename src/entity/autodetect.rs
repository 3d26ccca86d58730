use crate::entity::schemes::TaggingFormat;
use ahash::AHashSet;
use enum_iterator::all;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum AutoDetectError {
    #[error("No tagging format could parse every sequence of the input")]
    NoFormatParsed,
}

/// Order in which the surviving formats are picked. IOB2 input parses as IOB with the same spans,
/// and input without any span parses with every format.
const DETECTION_ORDER: [TaggingFormat; 4] = [
    TaggingFormat::IOB2,
    TaggingFormat::IOB,
    TaggingFormat::BIOES,
    TaggingFormat::BILOU,
];

/// This impl block contains the logic of the auto-detect feature.
impl TaggingFormat {
    /// Detects the tagging format used by a list of tag sequences by parsing them with every
    /// format and keeping the ones that succeed. This function incurs a runtime cost, but it is
    /// called at most once per evaluation.
    ///
    /// * `sequences`: Tag sequences, one per document.
    /// * `suffix`: Is the prefix located at the end of the tags?
    pub fn try_auto_detect<Q, S>(
        sequences: &[Q],
        suffix: bool,
    ) -> Result<TaggingFormat, AutoDetectError>
    where
        Q: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut possible_formats = Self::list_possible_formats();
        for sequence in sequences.iter() {
            possible_formats.retain(|format| {
                format
                    .loader()
                    .with_suffix(suffix)
                    .retrieve_spans_from_tags(sequence.as_ref())
                    .is_ok()
            });
            if possible_formats.is_empty() {
                return Err(AutoDetectError::NoFormatParsed);
            }
        }
        debug!(candidates = ?possible_formats, "tagging formats surviving auto-detection");
        let detected = DETECTION_ORDER
            .into_iter()
            .find(|format| possible_formats.contains(format))
            .ok_or(AutoDetectError::NoFormatParsed)?;
        debug!(%detected, "detected tagging format");
        Ok(detected)
    }

    fn list_possible_formats() -> AHashSet<TaggingFormat> {
        all::<TaggingFormat>().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn build_str_vec() -> Vec<&'static str> {
        vec!["B-PER", "I-PER", "O", "B-LOC"]
    }
    fn build_str_vec_diff() -> Vec<&'static str> {
        vec![
            "B-GEO", "I-GEO", "O", "B-GEO", "O", "B-PER", "I-PER", "I-PER", "B-LOC",
        ]
    }

    #[test]
    fn test_auto_detect_format() {
        let inputs = vec![build_str_vec_diff(), build_str_vec()];
        let actual = TaggingFormat::try_auto_detect::<Vec<&str>, &str>(&inputs, false).unwrap();
        assert_eq!(actual, TaggingFormat::IOB2)
    }

    #[rstest]
    #[case(vec![vec!["I-PER", "I-PER", "O"]], TaggingFormat::IOB)]
    #[case(vec![vec!["B-PER", "E-PER", "S-LOC"]], TaggingFormat::BIOES)]
    #[case(vec![vec!["U-PER", "O"], vec!["B-LOC", "L-LOC"]], TaggingFormat::BILOU)]
    #[case(vec![vec!["O", "O"]], TaggingFormat::IOB2)]
    #[case(vec![], TaggingFormat::IOB2)]
    fn test_auto_detect_cases(
        #[case] inputs: Vec<Vec<&str>>,
        #[case] expected: TaggingFormat,
    ) {
        assert_eq!(
            TaggingFormat::try_auto_detect::<Vec<&str>, &str>(&inputs, false).unwrap(),
            expected
        );
    }

    #[test]
    fn test_auto_detect_suffix() {
        let inputs = vec![vec!["PER-U", "O", "LOC-B", "LOC-L"]];
        assert_eq!(
            TaggingFormat::try_auto_detect::<Vec<&str>, &str>(&inputs, true).unwrap(),
            TaggingFormat::BILOU
        );
    }

    #[test]
    fn test_no_format_parsed() {
        let inputs = vec![vec!["B-PER", "E-PER"], vec!["U-LOC"]];
        assert_eq!(
            TaggingFormat::try_auto_detect::<Vec<&str>, &str>(&inputs, false),
            Err(AutoDetectError::NoFormatParsed)
        );
    }
}
