//! The keypad token alphabet.
//!
//! Every input reaching the editor is one of these tokens, whether it came
//! from the keyboard or from a click on the on-screen keypad. Tokens are
//! atomic: the `00` button is a single token, not two zeros.

/// Arithmetic operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl Operator {
    /// The operator's character form.
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    /// Parse a single operator character.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
}

/// One keypad token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Digit `0`..`9`.
    Digit(u8),
    /// The dedicated `00` button.
    DoubleZero,
    /// Decimal point.
    Decimal,
    /// Delete one character from the focused field.
    Backspace,
    /// Confirm / advance.
    Enter,
    /// Move focus forward.
    Next,
    /// Move focus backward.
    Prev,
    /// Arithmetic operator.
    Op(Operator),
    /// Any other printable character typed on the keyboard.
    Char(char),
}

impl Key {
    /// Text this token contributes when appended to a field, or `None` for
    /// pure navigation and editing tokens.
    pub fn text(self) -> Option<String> {
        match self {
            Key::Digit(d) => Some(d.to_string()),
            Key::DoubleZero => Some("00".to_string()),
            Key::Decimal => Some(".".to_string()),
            Key::Op(op) => Some(op.symbol().to_string()),
            Key::Char(ch) => Some(ch.to_string()),
            Key::Backspace | Key::Enter | Key::Next | Key::Prev => None,
        }
    }

    /// Short label for the on-screen keypad cell.
    pub fn label(self) -> &'static str {
        const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
        match self {
            Key::Digit(d) => DIGITS[usize::from(d.min(9))],
            Key::DoubleZero => "00",
            Key::Decimal => ".",
            Key::Backspace => "DEL",
            Key::Enter => "ENT",
            Key::Next => ">",
            Key::Prev => "<",
            Key::Op(Operator::Add) => "+",
            Key::Op(Operator::Subtract) => "-",
            Key::Op(Operator::Multiply) => "*",
            Key::Op(Operator::Divide) => "/",
            Key::Char(_) => "",
        }
    }
}

/// On-screen keypad layout, top row first.
pub const KEYPAD_GRID: [[Key; 5]; 4] = [
    [
        Key::Digit(7),
        Key::Digit(8),
        Key::Digit(9),
        Key::Backspace,
        Key::Enter,
    ],
    [
        Key::Digit(4),
        Key::Digit(5),
        Key::Digit(6),
        Key::Op(Operator::Multiply),
        Key::Op(Operator::Divide),
    ],
    [
        Key::Digit(1),
        Key::Digit(2),
        Key::Digit(3),
        Key::Op(Operator::Add),
        Key::Op(Operator::Subtract),
    ],
    [
        Key::Digit(0),
        Key::DoubleZero,
        Key::Decimal,
        Key::Prev,
        Key::Next,
    ],
];
