//! User capability flags
//!
//! Chat and user-list frames carry a `flag1|flag2` field holding two
//! decimal bitmasks. Each named capability is one bit; bits without a name
//! are dropped.

use crate::protocol::constants::FLAG_SEPARATOR;

macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident = $bit:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: bool, )+
        }

        impl $name {
            /// Union of all named bits
            pub const MASK: u32 = 0 $( | (1u32 << $bit) )+;

            /// Project each named bit of `mask`
            pub fn from_bits(mask: u32) -> Self {
                Self {
                    $( $field: (mask >> $bit) & 1 == 1, )+
                }
            }

            #[cfg(test)]
            fn bits(&self) -> u32 {
                let mut mask = 0u32;
                $( if self.$field { mask |= 1u32 << $bit; } )+
                mask
            }
        }
    };
}

flag_set! {
    /// First flag mask: roles and viewer state
    Flag1 {
        /// Site administrator
        admin = 0,
        hidden = 1,
        /// Broadcaster
        bj = 2,
        /// Muted
        dumb = 3,
        guest = 4,
        fanclub = 5,
        auto_manager = 6,
        manager_list = 7,
        /// Channel manager
        manager = 8,
        female = 9,
        auto_dumb = 10,
        dumb_blind = 11,
        dobae_blind = 12,
        exit_user = 13,
        mobile = 14,
        top_fan = 15,
        realname = 16,
        no_direct = 17,
        global_app = 18,
        quick_view = 19,
        sptr_sticker = 20,
        chromecast = 21,
        dobae_blind2 = 24,
        subscriber = 28,
        noti_vod_balloon = 30,
        noti_top_fan = 31,
    }
}

flag_set! {
    /// Second flag mask: affiliations and client type
    Flag2 {
        global_pc = 0,
        clan = 1,
        top_clan = 2,
        top20 = 3,
        game_god = 4,
        atag_allow = 5,
        no_super_chat = 6,
        no_recv_chat = 7,
        flash = 8,
        lg_game = 9,
        employee = 10,
        clean_ati = 11,
        police = 12,
        admin_chat = 13,
        pc = 14,
        specify = 15,
    }
}

/// Both flag sets of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFlag {
    pub flag1: Flag1,
    pub flag2: Flag2,
}

impl UserFlag {
    /// Decode from the two raw masks
    pub fn from_masks(flag1: u32, flag2: u32) -> Self {
        Self {
            flag1: Flag1::from_bits(flag1),
            flag2: Flag2::from_bits(flag2),
        }
    }

    /// Decode a `flag1|flag2` wire field
    ///
    /// A missing or non-numeric token counts as 0.
    pub fn parse(field: &str) -> Self {
        let mut tokens = field.split(FLAG_SEPARATOR);
        let flag1 = tokens.next().map(parse_mask).unwrap_or(0);
        let flag2 = tokens.next().map(parse_mask).unwrap_or(0);
        Self::from_masks(flag1, flag2)
    }
}

/// Masks are unsigned on the wire but some senders print bit 31 as a
/// negative 32-bit integer.
fn parse_mask(token: &str) -> u32 {
    let token = token.trim();
    token
        .parse::<u32>()
        .or_else(|_| token.parse::<i32>().map(|v| v as u32))
        .unwrap_or(0)
}
