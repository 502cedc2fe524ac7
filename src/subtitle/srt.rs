use crate::error::{Result, SubburnError};
use super::{floor_units, SubtitleCue, SubtitleStyle};

/// Encode cues as SubRip text, numbering records from 1.
pub fn encode_srt(cues: &[SubtitleCue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(index, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                index + 1,
                format_srt_time(cue.start),
                format_srt_time(cue.end),
                srt_text(&cue.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Blank lines end a record in SRT, so runs of them inside cue text collapse
/// to one empty line and leading or trailing ones are dropped.
fn srt_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if lines.last().is_some_and(|last| !last.is_empty()) {
                lines.push("");
            }
        } else {
            lines.push(line);
        }
    }
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}

/// Decode SubRip text. Every cue gets the default style since SRT carries none.
pub fn decode_srt(text: &str) -> Result<Vec<SubtitleCue>> {
    let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut cues: Vec<SubtitleCue> = Vec::new();
    for block in blocks(&normalized) {
        let mut lines = block.iter().copied();
        let Some(first) = lines.next() else { continue };

        let timing = if first.contains("-->") {
            first
        } else {
            match block.get(1) {
                Some(&line) if line.contains("-->") => {
                    lines.next();
                    line
                }
                _ => {
                    // A block without timing continues the previous cue's text
                    // after an empty line.
                    let Some(previous) = cues.last_mut() else {
                        return Err(SubburnError::Validation(format!(
                            "SRT record '{}' has no timing line",
                            first.trim()
                        )));
                    };
                    previous.text.push_str("\n\n");
                    previous.text.push_str(&block.join("\n"));
                    continue;
                }
            }
        };

        let (start, end) = parse_timing_line(timing)?;
        cues.push(SubtitleCue {
            start,
            end,
            text: lines.collect::<Vec<_>>().join("\n"),
            style: SubtitleStyle::default(),
        });
    }

    Ok(cues)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm), truncating to the millisecond
pub fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = floor_units(seconds, 1000.0);
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse `HH:MM:SS,mmm` (a `.` separator is accepted too) into seconds.
pub fn parse_srt_time(value: &str) -> Result<f64> {
    let invalid = || SubburnError::Validation(format!("invalid SRT timestamp '{}'", value));

    let value = value.trim();
    let (clock, fraction) = value
        .split_once(',')
        .or_else(|| value.split_once('.'))
        .unwrap_or((value, ""));

    let fields: Vec<&str> = clock.split(':').collect();
    let (h, m, s) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };
    let hours: u64 = h.trim().parse().map_err(|_| invalid())?;
    let minutes: u64 = m.trim().parse().map_err(|_| invalid())?;
    let secs: u64 = s.trim().parse().map_err(|_| invalid())?;

    let millis = parse_fraction(fraction, 3).ok_or_else(invalid)?;
    let total_ms = clock_units(hours, minutes, secs, 1000, millis).ok_or_else(invalid)?;
    Ok(total_ms as f64 / 1000.0)
}

/// `hours:minutes:secs` plus `fraction` expressed in `units_per_second`,
/// or `None` if the total does not fit in a `u64`.
pub(crate) fn clock_units(hours: u64, minutes: u64, secs: u64, units_per_second: u64, fraction: u64) -> Option<u64> {
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(secs)?
        .checked_mul(units_per_second)?
        .checked_add(fraction)
}

/// Read a decimal fraction as an integer count of `10^-digits` units.
pub(crate) fn parse_fraction(fraction: &str, digits: usize) -> Option<u64> {
    let fraction = fraction.trim();
    if fraction.is_empty() {
        return Some(0);
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut scaled: String = fraction.chars().take(digits).collect();
    while scaled.len() < digits {
        scaled.push('0');
    }
    scaled.parse().ok()
}

fn parse_timing_line(line: &str) -> Result<(f64, f64)> {
    let (start, rest) = line.split_once("-->").ok_or_else(|| {
        SubburnError::Validation(format!("invalid SRT timing line '{}'", line))
    })?;
    // Anything after the end time (positioning hints) is ignored.
    let end = rest.split_whitespace().next().unwrap_or("");
    Ok((parse_srt_time(start)?, parse_srt_time(end)?))
}

fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(65.123), "00:01:05,123");
        assert_eq!(format_srt_time(3661.500), "01:01:01,500");
        assert_eq!(format_srt_time(1.9999), "00:00:01,999");
    }

    #[test]
    fn encodes_the_reference_example() {
        let cues = vec![
            SubtitleCue::new(0.5, 3.0, "Hello"),
            SubtitleCue::new(3.5, 6.0, "World"),
        ];
        assert_eq!(
            encode_srt(&cues),
            "1\n00:00:00,500 --> 00:00:03,000\nHello\n\n2\n00:00:03,500 --> 00:00:06,000\nWorld\n"
        );
        assert_eq!(encode_srt(&[]), "");
    }

    #[test]
    fn decode_reverses_encode_within_a_millisecond() {
        let cues = vec![
            SubtitleCue::new(0.29, 1.0005, "first"),
            SubtitleCue::new(3599.999, 3723.456, "two\nlines"),
            SubtitleCue::new(10.0, 12.0, "out of order is fine"),
        ];
        let decoded = decode_srt(&encode_srt(&cues)).unwrap();

        assert_eq!(decoded.len(), cues.len());
        for (original, back) in cues.iter().zip(&decoded) {
            assert!((original.start - back.start).abs() < 0.001);
            assert!((original.end - back.end).abs() < 0.001);
            assert_eq!(original.text, back.text);
            assert_eq!(back.style, SubtitleStyle::default());
        }
    }

    #[test]
    fn decode_tolerates_crlf_bom_and_missing_index() {
        let text = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,500\r\nA\r\n\r\n00:00:03.000 --> 00:00:04.000 X1:10\r\nB\r\n";
        let cues = decode_srt(text).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "A");
        assert_eq!(cues[0].end, 2.5);
        assert_eq!(cues[1].start, 3.0);
        assert_eq!(cues[1].text, "B");
    }

    #[test]
    fn malformed_timing_is_a_validation_error() {
        let err = decode_srt("1\n00:00:aa,000 --> 00:00:01,000\nx\n").unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));

        let err = decode_srt("1\njust text\n").unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));
    }

    #[test]
    fn blank_lines_inside_cue_text_survive_a_round_trip() {
        let cues = vec![
            SubtitleCue::new(1.0, 2.0, "verse one\n\nverse two"),
            SubtitleCue::new(3.0, 4.0, "chorus"),
        ];
        let decoded = decode_srt(&encode_srt(&cues)).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].text, "verse one\n\nverse two");
        assert_eq!(decoded[1].text, "chorus");
        assert_eq!(decoded[1].start, 3.0);
    }

    #[test]
    fn whitespace_only_lines_are_collapsed_on_encode() {
        let encoded = encode_srt(&[SubtitleCue::new(0.0, 1.0, "\na\n \n\n\tb\n\n")]);
        assert_eq!(encoded, "1\n00:00:00,000 --> 00:00:01,000\na\n\n\tb\n");
        assert_eq!(decode_srt(&encoded).unwrap()[0].text, "a\n\n\tb");
    }

    #[test]
    fn oversized_hours_are_rejected_not_wrapped() {
        let err = decode_srt("1\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nx\n").unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));
        assert!(parse_srt_time("9999999999999999:00:00,000").is_err());
        assert_eq!(clock_units(1, 2, 3, 1000, 4), Some(3_723_004));
    }

    #[test]
    fn short_fractions_are_scaled() {
        assert_eq!(parse_srt_time("00:00:01,5").unwrap(), 1.5);
        assert_eq!(parse_srt_time("01:02").unwrap(), 62.0);
    }
}
