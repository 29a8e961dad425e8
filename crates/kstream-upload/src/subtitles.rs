//! Subtitle format conversion.
//!
//! The dashboard accepts SRT and VTT uploads; the video host only takes VTT.
//! Conversion strips the UTF-8 BOM, drops SRT cue counter lines, rewrites
//! comma decimal separators in timestamps to periods and prepends the WEBVTT
//! header.

/// True when the payload already carries a WEBVTT header.
pub fn is_vtt(content: &str) -> bool {
    strip_bom(content).trim_start().starts_with("WEBVTT")
}

/// Convert SRT content to VTT. VTT input is passed through with only BOM
/// stripping and header normalization.
pub fn convert_srt_to_vtt(content: &str) -> String {
    let content = strip_bom(content);

    if is_vtt(content) {
        return content.replace("\r\n", "\n");
    }

    let mut out = String::with_capacity(content.len() + 8);
    out.push_str("WEBVTT\n\n");

    for line in content.replace("\r\n", "\n").lines() {
        // SRT numbers every cue on its own line; VTT has no counters.
        if is_cue_counter(line) {
            continue;
        }
        if is_timestamp_line(line) {
            out.push_str(&line.replace(',', "."));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// A line that is nothing but digits (an SRT cue counter).
fn is_cue_counter(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// A cue timing line like `00:00:01,500 --> 00:00:03,000`.
fn is_timestamp_line(line: &str) -> bool {
    line.contains("-->")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:01,500 --> 00:00:03,000\nHello there.\n\n2\n00:00:04,000 --> 00:00:06,250\nGeneral Kenobi!\n";

    #[test]
    fn test_srt_conversion() {
        let vtt = convert_srt_to_vtt(SRT);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:01.500 --> 00:00:03.000"));
        assert!(vtt.contains("00:00:04.000 --> 00:00:06.250"));
        // Counter lines are dropped entirely.
        for line in vtt.lines() {
            assert!(!is_cue_counter(line), "counter survived: {line:?}");
        }
        assert!(vtt.contains("Hello there."));
        assert!(vtt.contains("General Kenobi!"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let with_bom = format!("\u{feff}{SRT}");
        let vtt = convert_srt_to_vtt(&with_bom);
        assert!(vtt.starts_with("WEBVTT"));
    }

    #[test]
    fn test_crlf_input() {
        let crlf = SRT.replace('\n', "\r\n");
        let vtt = convert_srt_to_vtt(&crlf);
        assert!(!vtt.contains('\r'));
        assert!(vtt.contains("00:00:01.500 --> 00:00:03.000"));
    }

    #[test]
    fn test_vtt_passthrough() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nAlready converted\n";
        assert!(is_vtt(input));
        assert_eq!(convert_srt_to_vtt(input), input);
    }

    #[test]
    fn test_commas_in_cue_text_survive() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nWell, hello, friend\n";
        let vtt = convert_srt_to_vtt(srt);
        assert!(vtt.contains("Well, hello, friend"));
        assert!(vtt.contains("00:00:01.000 --> 00:00:02.000"));
    }
}
