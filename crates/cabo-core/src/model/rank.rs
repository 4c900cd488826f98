use crate::model::action::ActionKind;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Joker = 0,
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    pub const COUNT: usize = 14;

    pub const ORDERED: [Rank; Rank::COUNT] = [
        Rank::Joker,
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rank::Joker),
            1 => Some(Rank::Ace),
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Points this card adds to a hand total at the end of a round.
    pub const fn points(self) -> u8 {
        self as u8
    }

    /// Number of copies of this rank in the shared deck.
    pub const fn copies_in_deck(self) -> u8 {
        match self {
            Rank::Joker => 2,
            _ => 4,
        }
    }

    pub const fn is_wildcard(self) -> bool {
        matches!(self, Rank::Joker)
    }

    pub const fn action(self) -> Option<ActionKind> {
        match self {
            Rank::Seven | Rank::Eight => Some(ActionKind::PeekOwn),
            Rank::Nine | Rank::Ten => Some(ActionKind::PeekOpponent),
            Rank::Jack => Some(ActionKind::BlindSwap),
            Rank::Queen => Some(ActionKind::PeekAndSwap),
            Rank::King => Some(ActionKind::DeclareOwn),
            Rank::Joker => Some(ActionKind::ForceDraw),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Joker => "*",
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        };
        f.write_str(text)
    }
}
