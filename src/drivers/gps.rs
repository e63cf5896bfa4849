use core::str::FromStr;

/// Knots to metres per second.
const MPS_PER_KNOT: f32 = 0.514444;
/// Kilometres per hour to metres per second.
const KMH_PER_MPS: f32 = 3.6;

// ─── Sentence classification ───
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NmeaFrame {
    #[default]
    None,
    Gga,
    Gsa,
    Rmc,
    Gsv,
    Gll,
    Vtg,
}

impl NmeaFrame {
    fn classify(id: &str) -> Self {
        match id {
            "GGA" => NmeaFrame::Gga,
            "GSA" => NmeaFrame::Gsa,
            "RMC" => NmeaFrame::Rmc,
            "GSV" => NmeaFrame::Gsv,
            "GLL" => NmeaFrame::Gll,
            "VTG" => NmeaFrame::Vtg,
            _ => NmeaFrame::None,
        }
    }
}

/// What a complete sentence produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NmeaEvent<'a> {
    /// Ground speed in m/s from a sentence carrying a valid fix.
    Speed(f32),
    /// Checksum-valid sentence with an identifier the parser does not know.
    Unknown(&'a str),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NmeaStats {
    pub sentences_rx: u16,     // checksum-valid sentences
    pub checksum_errors: u16,  // checksum mismatches
    pub frame_errors: u16,     // buffer overflows
    pub unknown_count: u16,    // unrecognised sentence IDs
    pub last_frame: NmeaFrame, // which sentence was last parsed
}

/// Byte-fed NMEA 0183 parser. Only the fields the speed path needs are kept:
/// fix validity and satellite count from GGA/RMC, ground speed from RMC/VTG.
pub struct NmeaParser {
    buffer: heapless::String<128>,
    fix: bool,
    sats: u8,
    pub stats: NmeaStats,
}

impl NmeaParser {
    pub fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
            fix: false,
            sats: 0,
            stats: NmeaStats::default(),
        }
    }

    pub fn has_fix(&self) -> bool {
        self.fix
    }

    pub fn sats(&self) -> u8 {
        self.sats
    }

    /// Process incoming bytes from the UART, calling `on_event` for every
    /// sentence that yields something.
    pub fn push_data<F>(&mut self, data: &[u8], mut on_event: F)
    where
        F: FnMut(NmeaEvent<'_>),
    {
        for &b in data {
            if b == b'$' {
                self.buffer.clear();
            }

            if self.buffer.push(b as char).is_err() {
                self.stats.frame_errors = self.stats.frame_errors.wrapping_add(1);
                self.buffer.clear();
                continue;
            }

            if b == b'\n' {
                let line = core::mem::take(&mut self.buffer);
                self.parse_sentence(line.as_str().trim(), &mut on_event);
                self.buffer = line;
                self.buffer.clear();
            }
        }
    }

    fn parse_sentence<F>(&mut self, s: &str, on_event: &mut F)
    where
        F: FnMut(NmeaEvent<'_>),
    {
        if s.len() < 6 || !s.starts_with('$') {
            return;
        }

        if !verify_checksum(s) {
            self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
            return;
        }

        // $ttSSS: two talker characters, then the sentence ID
        let frame = s.get(3..6).map(NmeaFrame::classify).unwrap_or_default();
        self.stats.sentences_rx = self.stats.sentences_rx.wrapping_add(1);
        self.stats.last_frame = frame;

        let body = s.split_once('*').map_or(s, |(body, _)| body);
        let speed = match frame {
            NmeaFrame::Gga => {
                self.parse_gga(body);
                None
            }
            NmeaFrame::Rmc => self.parse_rmc(body),
            NmeaFrame::Vtg => self.parse_vtg(body),
            NmeaFrame::Gsa | NmeaFrame::Gsv | NmeaFrame::Gll => None,
            NmeaFrame::None => {
                self.stats.unknown_count = self.stats.unknown_count.wrapping_add(1);
                on_event(NmeaEvent::Unknown(s));
                None
            }
        };

        if let Some(mps) = speed {
            on_event(NmeaEvent::Speed(mps));
        }
    }

    // ────── GGA ──────
    fn parse_gga(&mut self, s: &str) {
        // $xxGGA,time,lat,NS,lon,EW,qual,sats,hdop,alt,M,geoid,M,…
        let mut parts = s.split(',').skip(6);
        let qual_str = parts.next().unwrap_or("");
        let sats_str = parts.next().unwrap_or("");

        self.fix = u8::from_str(qual_str).map_or(false, |q| q > 0);
        if let Ok(n) = u8::from_str(sats_str) {
            self.sats = n;
        }
    }

    // ────── RMC ──────
    fn parse_rmc(&mut self, s: &str) -> Option<f32> {
        // $xxRMC,time,status,lat,NS,lon,EW,speed,course,date,…
        let mut parts = s.split(',').skip(2);
        let status = parts.next().unwrap_or("");
        let speed_raw = parts.nth(4).unwrap_or("");

        // A=active, V=void
        self.fix = status == "A";
        if !self.fix {
            return None;
        }
        f32::from_str(speed_raw).ok().map(|knots| knots * MPS_PER_KNOT)
    }

    // ────── VTG ──────
    fn parse_vtg(&mut self, s: &str) -> Option<f32> {
        // $xxVTG,courseT,T,courseM,M,knots,N,kmh,K,mode
        let mut parts = s.split(',').skip(7);
        let kmh_raw = parts.next().unwrap_or("");
        let mode = parts.nth(1).unwrap_or("");

        if !self.fix || mode == "N" {
            return None;
        }
        f32::from_str(kmh_raw).ok().map(|kmh| kmh / KMH_PER_MPS)
    }
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

fn verify_checksum(s: &str) -> bool {
    if let Some((content, check_str)) = s.split_once('*') {
        let content = content.strip_prefix('$').unwrap_or(content);
        let calc = content.bytes().fold(0u8, |acc, b| acc ^ b);
        // Only the first 2 hex chars count
        let hex = check_str.get(..2).unwrap_or(check_str);
        if let Ok(val) = u8::from_str_radix(hex.trim(), 16) {
            return calc == val;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::{String, ToString};
    use std::vec::Vec;

    /// Frame a sentence body with `$`, checksum and CRLF.
    fn sentence(body: &str) -> String {
        let cs = body.bytes().fold(0u8, |acc, b| acc ^ b);
        std::format!("${}*{:02X}\r\n", body, cs)
    }

    #[derive(Debug, PartialEq)]
    enum Seen {
        Speed(f32),
        Unknown(String),
    }

    fn feed(parser: &mut NmeaParser, bytes: &[u8]) -> Vec<Seen> {
        let mut seen = Vec::new();
        parser.push_data(bytes, |ev| match ev {
            NmeaEvent::Speed(v) => seen.push(Seen::Speed(v)),
            NmeaEvent::Unknown(s) => seen.push(Seen::Unknown(s.to_string())),
        });
        seen
    }

    fn speed_of(seen: &[Seen]) -> f32 {
        match seen {
            [Seen::Speed(v)] => *v,
            other => panic!("expected one speed event, got {:?}", other),
        }
    }

    #[test]
    fn rmc_active_reports_knots_as_mps() {
        let mut p = NmeaParser::new();
        let s = sentence("GPRMC,123519,A,4807.038,N,01131.000,E,10.0,084.4,230394,003.1,W");
        let v = speed_of(&feed(&mut p, s.as_bytes()));
        assert!((v - 5.14444).abs() < 1e-4);
        assert!(p.has_fix());
        assert_eq!(p.stats.last_frame, NmeaFrame::Rmc);
    }

    #[test]
    fn rmc_void_reports_nothing() {
        let mut p = NmeaParser::new();
        let s = sentence("GPRMC,123519,V,,,,,0.5,,230394,,");
        assert!(feed(&mut p, s.as_bytes()).is_empty());
        assert!(!p.has_fix());
    }

    #[test]
    fn vtg_needs_a_prior_fix() {
        let mut p = NmeaParser::new();
        let vtg = sentence("GPVTG,054.7,T,034.4,M,005.5,N,036.0,K,A");
        assert!(feed(&mut p, vtg.as_bytes()).is_empty());

        let gga = sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,");
        assert!(feed(&mut p, gga.as_bytes()).is_empty());
        assert_eq!(p.sats(), 8);

        let v = speed_of(&feed(&mut p, vtg.as_bytes()));
        assert!((v - 10.0).abs() < 1e-4);
    }

    #[test]
    fn vtg_not_valid_mode_is_ignored() {
        let mut p = NmeaParser::new();
        feed(&mut p, sentence("GNGGA,0,0,N,0,E,1,05,1.0,0,M,0,M,,").as_bytes());
        let vtg = sentence("GNVTG,,T,,M,0.0,N,20.0,K,N");
        assert!(feed(&mut p, vtg.as_bytes()).is_empty());
    }

    #[test]
    fn gga_without_fix_clears_it() {
        let mut p = NmeaParser::new();
        feed(&mut p, sentence("GPRMC,0,A,,,,,1.0,,,,").as_bytes());
        assert!(p.has_fix());
        feed(&mut p, sentence("GPGGA,0,,,,,0,00,,,M,,M,,").as_bytes());
        assert!(!p.has_fix());
    }

    #[test]
    fn bad_checksum_is_counted_and_dropped() {
        let mut p = NmeaParser::new();
        let seen = feed(&mut p, b"$GPRMC,0,A,,,,,10.0,,,,*00\r\n");
        assert!(seen.is_empty());
        assert_eq!(p.stats.checksum_errors, 1);
        assert_eq!(p.stats.sentences_rx, 0);
    }

    #[test]
    fn unknown_sentence_is_reported_whole() {
        let mut p = NmeaParser::new();
        let s = sentence("GPTXT,01,01,02,ANTSTATUS=OK");
        let seen = feed(&mut p, s.as_bytes());
        assert_eq!(seen, [Seen::Unknown(s.trim().to_string())]);
        assert_eq!(p.stats.unknown_count, 1);
    }

    #[test]
    fn known_but_unused_sentences_are_silent() {
        let mut p = NmeaParser::new();
        let burst: String = [
            sentence("GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1"),
            sentence("GPGSV,1,1,01,01,40,083,46"),
            sentence("GPGLL,4916.45,N,12311.12,W,225444,A"),
        ]
        .concat();
        assert!(feed(&mut p, burst.as_bytes()).is_empty());
        assert_eq!(p.stats.sentences_rx, 3);
        assert_eq!(p.stats.unknown_count, 0);
    }

    #[test]
    fn sentence_split_across_reads() {
        let mut p = NmeaParser::new();
        let s = sentence("GPRMC,0,A,,,,,2.0,,,,");
        let (a, b) = s.as_bytes().split_at(11);
        assert!(feed(&mut p, a).is_empty());
        let v = speed_of(&feed(&mut p, b));
        assert!((v - 1.028888).abs() < 1e-4);
    }

    #[test]
    fn garbage_before_dollar_is_discarded() {
        let mut p = NmeaParser::new();
        let mut bytes = b"\x00\xffnoise".to_vec();
        bytes.extend_from_slice(sentence("GPRMC,0,A,,,,,1.0,,,,").as_bytes());
        assert_eq!(feed(&mut p, &bytes).len(), 1);
    }

    #[test]
    fn overlong_line_counts_a_frame_error_and_recovers() {
        let mut p = NmeaParser::new();
        let mut bytes = b"$GP".to_vec();
        bytes.extend(core::iter::repeat(b'X').take(200));
        assert!(feed(&mut p, &bytes).is_empty());
        assert!(p.stats.frame_errors >= 1);

        let v = speed_of(&feed(&mut p, sentence("GPRMC,0,A,,,,,1.0,,,,").as_bytes()));
        assert!((v - MPS_PER_KNOT).abs() < 1e-6);
    }
}
