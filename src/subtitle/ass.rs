use std::collections::HashMap;

use crate::error::{Result, SubburnError};
use super::color::AssColor;
use super::srt::{clock_units, parse_fraction};
use super::{floor_units, SubtitleCue, SubtitleStyle};

const SCRIPT_HEADER: &str = "[Script Info]
Title: AutoSubtitlesApp
ScriptType: v4.00+
WrapStyle: 0
PlayResX: 1920
PlayResY: 1080
ScaledBorderAndShadow: yes

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
";

const EVENTS_HEADER: &str = "
[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// Encode cues as an ASS script.
///
/// Styles are deduplicated by full structural equality: the first cue carrying
/// a distinct style allocates `Style0`, the next distinct one `Style1`, and so
/// on in first-seen order. Every cue sharing a style references the same slot.
pub fn encode_ass(cues: &[SubtitleCue]) -> String {
    let mut slots: HashMap<String, String> = HashMap::new();
    let mut cue_slots = Vec::with_capacity(cues.len());
    let mut out = String::from(SCRIPT_HEADER);

    for cue in cues {
        let key = cue.style.dedup_key();
        let name = match slots.get(&key) {
            Some(name) => name.clone(),
            None => {
                let name = format!("Style{}", slots.len());
                out.push_str(&style_line(&name, &cue.style));
                slots.insert(key, name.clone());
                name
            }
        };
        cue_slots.push(name);
    }

    out.push_str(EVENTS_HEADER);

    for (cue, style_name) in cues.iter().zip(&cue_slots) {
        out.push_str(&format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}\n",
            format_ass_time(cue.start),
            format_ass_time(cue.end),
            style_name,
            escape_text(&cue.text)
        ));
    }

    out
}

/// Decode the `[Events]` dialogue lines of an ASS script.
///
/// Only timing and text are recovered; every cue gets the default style.
pub fn decode_ass(text: &str) -> Result<Vec<SubtitleCue>> {
    let mut cues = Vec::new();
    let mut in_events = false;

    for line in text.trim_start_matches('\u{feff}').lines() {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_events = trimmed.eq_ignore_ascii_case("[Events]");
            continue;
        }
        if !in_events {
            continue;
        }

        let Some(body) = line.strip_prefix("Dialogue:") else { continue };
        // Text is the tenth field and may itself contain commas.
        let fields: Vec<&str> = body.splitn(10, ',').collect();
        if fields.len() < 10 {
            continue;
        }

        cues.push(SubtitleCue {
            start: parse_ass_time(fields[1])?,
            end: parse_ass_time(fields[2])?,
            text: fields[9].replace("\\N", "\n"),
            style: SubtitleStyle::default(),
        });
    }

    Ok(cues)
}

/// Format seconds as `H:MM:SS.CC`, truncating to the centisecond.
pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = floor_units(seconds, 100.0);
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let secs = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

/// Parse `H:MM:SS.CC` into seconds.
pub fn parse_ass_time(value: &str) -> Result<f64> {
    let invalid = || SubburnError::Validation(format!("invalid ASS timestamp '{}'", value));

    let value = value.trim();
    let mut fields = value.split(':');
    let (Some(h), Some(m), Some(s), None) = (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

    let hours: u64 = h.parse().map_err(|_| invalid())?;
    let minutes: u64 = m.parse().map_err(|_| invalid())?;
    let secs: u64 = whole.parse().map_err(|_| invalid())?;
    let centis = parse_fraction(fraction, 2).ok_or_else(invalid)?;

    let total_cs = clock_units(hours, minutes, secs, 100, centis).ok_or_else(invalid)?;
    Ok(total_cs as f64 / 100.0)
}

fn style_line(name: &str, style: &SubtitleStyle) -> String {
    let text = AssColor::from_hex(&style.text_color).unwrap_or(AssColor::WHITE);
    let outline = AssColor::from_hex(&style.stroke_color).unwrap_or(AssColor::BLACK);
    let back = AssColor::from_hex(&style.bg_color).unwrap_or(AssColor::BLACK);
    // Opaque box shows the background; otherwise it is fully transparent.
    let back_alpha = if style.bg_opaque { 0x00 } else { 0xFF };

    format!(
        "Style: {},Arial,{},{},{},{},{},0,0,0,0,100,100,0,0,1,{},0,2,10,10,10,1\n",
        name,
        style.font_size,
        text.to_ass(0x00),
        text.to_ass(0x00),
        outline.to_ass(0x00),
        back.to_ass(back_alpha),
        style.stroke_width
    )
}

fn escape_text(text: &str) -> String {
    text.replace("\r\n", "\\N").replace('\n', "\\N")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(start: f64, text: &str, style: &SubtitleStyle) -> SubtitleCue {
        SubtitleCue {
            start,
            end: start + 1.0,
            text: text.to_string(),
            style: style.clone(),
        }
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(1.999), "0:00:01.99");
        assert_eq!(format_ass_time(3723.45), "1:02:03.45");
        assert_eq!(format_ass_time(36000.0), "10:00:00.00");
    }

    #[test]
    fn shared_styles_collapse_into_one_record() {
        let plain = SubtitleStyle::default();
        let loud = SubtitleStyle {
            text_color: "#FF0000".into(),
            font_size: 64,
            ..SubtitleStyle::default()
        };
        let cues = vec![
            styled(0.0, "a", &plain),
            styled(2.0, "b", &loud),
            styled(4.0, "c", &plain),
        ];

        let script = encode_ass(&cues);
        let styles: Vec<&str> = script.lines().filter(|l| l.starts_with("Style:")).collect();
        let events: Vec<&str> = script.lines().filter(|l| l.starts_with("Dialogue:")).collect();

        assert_eq!(styles.len(), 2);
        assert!(styles[0].starts_with("Style: Style0,Arial,48,"));
        assert!(styles[1].starts_with("Style: Style1,Arial,64,&H000000FF,"));
        assert!(events[0].contains(",Style0,"));
        assert!(events[1].contains(",Style1,"));
        assert!(events[2].contains(",Style0,"));
    }

    #[test]
    fn background_alpha_follows_opacity_flag() {
        let hidden = SubtitleStyle::default();
        let boxed = SubtitleStyle { bg_opaque: true, bg_color: "#102030".into(), ..SubtitleStyle::default() };

        assert_eq!(
            style_line("Style0", &hidden),
            "Style: Style0,Arial,48,&H00FFFFFF,&H00FFFFFF,&H00000000,&HFF000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1\n"
        );
        assert!(style_line("Style1", &boxed).contains(",&H00302010,0,0,0,0,"));
    }

    #[test]
    fn header_carries_fixed_script_metadata() {
        let script = encode_ass(&[SubtitleCue::new(0.0, 1.0, "x")]);
        assert!(script.starts_with("[Script Info]\n"));
        assert!(script.contains("PlayResX: 1920\nPlayResY: 1080\nScaledBorderAndShadow: yes\n"));
        assert!(script.contains("\n[Events]\nFormat: Layer, Start, End,"));
    }

    #[test]
    fn decode_reverses_encode_within_a_centisecond() {
        let cues = vec![
            SubtitleCue::new(0.5, 3.0, "Hello, world"),
            SubtitleCue::new(3.456, 6.789, "two\nlines"),
            SubtitleCue::new(4000.01, 4001.0, ""),
        ];
        let decoded = decode_ass(&encode_ass(&cues)).unwrap();

        assert_eq!(decoded.len(), 3);
        for (original, back) in cues.iter().zip(&decoded) {
            assert!((original.start - back.start).abs() < 0.01);
            assert!((original.end - back.end).abs() < 0.01);
            assert_eq!(original.text, back.text);
        }
    }

    #[test]
    fn decode_ignores_dialogue_outside_events() {
        let script = "[Script Info]\nDialogue: 0,0:00:00.00,0:00:01.00,S,,0,0,0,,nope\n[Events]\nDialogue: 0,0:00:02.00,0:00:03.50,S,,0,0,0,,yes\n";
        let cues = decode_ass(script).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "yes");
        assert_eq!(cues[0].end, 3.5);
    }

    #[test]
    fn malformed_time_is_rejected() {
        assert!(parse_ass_time("0:00").is_err());
        assert!(parse_ass_time("0:00:xx.00").is_err());
        assert!(matches!(
            parse_ass_time("99999999999999999:00:00.00"),
            Err(SubburnError::Validation(_))
        ));
    }
}
