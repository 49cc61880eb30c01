// 🗂️ View State - which panels are visible
//
// The three tab flags are the only stored state. Everything the window
// shows is derived from them by pure functions, so recomputing twice with
// the same flags always yields the same layout.

/// Height cap (layout units) of the person list when it shares space with loans
pub const PERSON_LIST_MAX_HEIGHT: u16 = 240;

// ============================================================================
// TAB FLAGS
// ============================================================================

/// Raw tab flags. Loans and analytics are never both set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabFlags {
    pub person: bool,
    pub loans: bool,
    pub analytics: bool,
}

impl TabFlags {
    pub const fn person_only() -> Self {
        TabFlags { person: true, loans: false, analytics: false }
    }

    pub const fn loans_only() -> Self {
        TabFlags { person: false, loans: true, analytics: false }
    }

    pub const fn person_and_loans() -> Self {
        TabFlags { person: true, loans: true, analytics: false }
    }

    pub const fn analytics_only() -> Self {
        TabFlags { person: false, loans: false, analytics: true }
    }

    pub const fn none() -> Self {
        TabFlags { person: false, loans: false, analytics: false }
    }

    pub fn is_consistent(&self) -> bool {
        !(self.loans && self.analytics)
    }
}

impl Default for TabFlags {
    fn default() -> Self {
        TabFlags::person_only()
    }
}

// ============================================================================
// VIEW STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Person,
    Loans,
    Analytics,
    PersonAndLoans,
}

impl ViewState {
    /// Derive the active view from the flags.
    ///
    /// Person + loans shows both, person alone or loans alone shows that
    /// panel, and anything else (including no flag at all) falls back to
    /// analytics.
    pub fn from_flags(flags: TabFlags) -> Self {
        debug_assert!(flags.is_consistent(), "loans and analytics tabs both active");

        match (flags.person, flags.loans) {
            (true, true) => ViewState::PersonAndLoans,
            (true, false) => ViewState::Person,
            (false, true) => ViewState::Loans,
            (false, false) => ViewState::Analytics,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ViewState::Person => "Persons",
            ViewState::Loans => "Loans",
            ViewState::Analytics => "Analytics",
            ViewState::PersonAndLoans => "Persons + Loans",
        }
    }
}

// ============================================================================
// PANEL LAYOUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSize {
    /// Grow into all remaining space
    Fill,
    /// Never taller than the given height
    Capped(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Person,
    Loans,
    Analytics,
}

/// Visibility and sizing of each panel; `None` means hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub person: Option<PanelSize>,
    pub loans: Option<PanelSize>,
    pub analytics: Option<PanelSize>,
}

impl PanelLayout {
    /// Visible panels in top-to-bottom order
    pub fn visible_panels(&self) -> Vec<(Panel, PanelSize)> {
        [
            (Panel::Person, self.person),
            (Panel::Loans, self.loans),
            (Panel::Analytics, self.analytics),
        ]
        .into_iter()
        .filter_map(|(panel, size)| size.map(|size| (panel, size)))
        .collect()
    }
}

pub fn layout_for(state: ViewState) -> PanelLayout {
    match state {
        ViewState::PersonAndLoans => PanelLayout {
            person: Some(PanelSize::Capped(PERSON_LIST_MAX_HEIGHT)),
            loans: Some(PanelSize::Fill),
            analytics: None,
        },
        ViewState::Person => PanelLayout {
            person: Some(PanelSize::Fill),
            loans: None,
            analytics: None,
        },
        ViewState::Loans => PanelLayout {
            person: None,
            loans: Some(PanelSize::Fill),
            analytics: None,
        },
        ViewState::Analytics => PanelLayout {
            person: None,
            loans: None,
            analytics: Some(PanelSize::Fill),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_consistent_flags() -> Vec<TabFlags> {
        let mut flags = Vec::new();
        for person in [false, true] {
            for loans in [false, true] {
                for analytics in [false, true] {
                    let f = TabFlags { person, loans, analytics };
                    if f.is_consistent() {
                        flags.push(f);
                    }
                }
            }
        }
        flags
    }

    #[test]
    fn test_person_only_fills() {
        let layout = layout_for(ViewState::from_flags(TabFlags::person_only()));
        assert_eq!(layout.visible_panels(), vec![(Panel::Person, PanelSize::Fill)]);
    }

    #[test]
    fn test_person_and_loans_caps_person() {
        let state = ViewState::from_flags(TabFlags::person_and_loans());
        assert_eq!(state, ViewState::PersonAndLoans);

        let layout = layout_for(state);
        assert_eq!(layout.person, Some(PanelSize::Capped(240)));
        assert_eq!(layout.loans, Some(PanelSize::Fill));
        assert_eq!(layout.analytics, None);
    }

    #[test]
    fn test_no_flags_defaults_to_analytics() {
        let layout = layout_for(ViewState::from_flags(TabFlags::none()));
        assert_eq!(layout.visible_panels(), vec![(Panel::Analytics, PanelSize::Fill)]);
    }

    #[test]
    fn test_analytics_flag_with_person_shows_person() {
        let flags = TabFlags { person: true, loans: false, analytics: true };
        assert_eq!(ViewState::from_flags(flags), ViewState::Person);
    }

    #[test]
    fn test_every_consistent_flag_state_maps_to_one_view_idempotently() {
        for flags in all_consistent_flags() {
            let first = ViewState::from_flags(flags);
            let second = ViewState::from_flags(flags);
            assert_eq!(first, second);
            assert_eq!(layout_for(first), layout_for(second));
            assert!(!layout_for(first).visible_panels().is_empty());
        }
    }

    #[test]
    fn test_inconsistent_flags_detected() {
        let flags = TabFlags { person: false, loans: true, analytics: true };
        assert!(!flags.is_consistent());
        assert!(TabFlags::default().is_consistent());
    }
}
