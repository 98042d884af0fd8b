use crate::format::FormatError;

/// Largest width or precision a spec may request.
pub const MAX_WIDTH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits.
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    /// Only negative numbers get a sign.
    #[default]
    Minus,
    Plus,
    Space,
}

/// A parsed `[[fill]align][sign][#][0][width][grouping][.precision][type]` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub sign: Sign,
    pub alternate: bool,
    pub zero: bool,
    pub width: Option<usize>,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

fn align_from(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let invalid = |reason: &str| FormatError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        let mut parsed = FormatSpec {
            fill: ' ',
            align: None,
            sign: Sign::Minus,
            alternate: false,
            zero: false,
            width: None,
            grouping: None,
            precision: None,
            kind: None,
        };

        if chars.len() >= 2
            && let Some(align) = align_from(chars[1])
        {
            parsed.fill = chars[0];
            parsed.align = Some(align);
            i = 2;
        }
        if parsed.align.is_none()
            && let Some(align) = chars.first().copied().and_then(align_from)
        {
            parsed.align = Some(align);
            i = 1;
        }

        match chars.get(i) {
            Some('+') => {
                parsed.sign = Sign::Plus;
                i += 1;
            }
            Some('-') => i += 1,
            Some(' ') => {
                parsed.sign = Sign::Space;
                i += 1;
            }
            _ => {}
        }

        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            parsed.zero = true;
            i += 1;
        }

        let (width, next) = read_number(&chars, i);
        if width.is_some_and(|w| w > MAX_WIDTH) {
            return Err(invalid("width too large"));
        }
        parsed.width = width;
        i = next;

        if let Some(&c @ (',' | '_')) = chars.get(i) {
            parsed.grouping = Some(c);
            i += 1;
        }

        if chars.get(i) == Some(&'.') {
            let (precision, next) = read_number(&chars, i + 1);
            match precision {
                None => return Err(invalid("format specifier missing precision")),
                Some(p) if p > MAX_WIDTH => return Err(invalid("precision too large")),
                Some(_) => {}
            }
            parsed.precision = precision;
            i = next;
        }

        if let Some(&kind) = chars.get(i) {
            parsed.kind = Some(kind);
            i += 1;
        }

        if i != chars.len() {
            return Err(invalid("invalid format specifier"));
        }
        Ok(parsed)
    }

    /// Pad `sign` + `body` out to the requested width.
    pub fn pad(&self, sign: &str, body: &str, default_align: Align) -> String {
        let (fill, align) = match self.align {
            Some(align) => (self.fill, align),
            None if self.zero => ('0', Align::AfterSign),
            None => (self.fill, default_align),
        };
        let len = sign.chars().count() + body.chars().count();
        let width = self.width.unwrap_or(0);
        if len >= width {
            return format!("{}{}", sign, body);
        }
        let pad = width - len;
        let repeat = |n: usize| fill.to_string().repeat(n);
        match align {
            Align::Left => format!("{}{}{}", sign, body, repeat(pad)),
            Align::Right => format!("{}{}{}", repeat(pad), sign, body),
            Align::Center => {
                let left = pad / 2;
                format!("{}{}{}{}", repeat(left), sign, body, repeat(pad - left))
            }
            Align::AfterSign => format!("{}{}{}", sign, repeat(pad), body),
        }
    }
}

fn read_number(chars: &[char], start: usize) -> (Option<usize>, usize) {
    let mut i = start;
    let mut n: Option<usize> = None;
    while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        i += 1;
    }
    (n, i)
}
