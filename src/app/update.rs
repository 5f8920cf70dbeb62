use crate::app::Model;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Scroll up by n lines
    ScrollUp(usize),
    /// Scroll down by n lines
    ScrollDown(usize),
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    GoToTop,
    GoToBottom,
    /// Go to percentage through document
    GoToPercent(u8),
    /// Scroll left by n columns (no-wrap mode)
    ScrollLeft(usize),
    /// Scroll right by n columns (no-wrap mode)
    ScrollRight(usize),
    NextHeading,
    PrevHeading,
    /// Terminal resized to (width, height)
    Resize(u16, u16),

    // Search
    /// Open the search prompt
    StartSearch,
    /// Replace the prompt text and search as the user types
    SearchInput(String),
    /// Close the prompt, keeping the results
    SubmitSearch,
    NextMatch,
    PrevMatch,
    ClearSearch,

    // Links
    /// Follow link by index
    FollowLink(usize),
    /// Follow the hovered or first visible link
    FollowPreferredLink,
    /// Update hovered link (or clear when none)
    HoverLink(Option<usize>),

    // Options
    ToggleLineNumbers,
    ToggleWrap,
    ToggleHighlight,

    // File watching
    ToggleWatch,
    /// File changed externally, reload
    FileChanged,
    /// Force reload file
    ForceReload,

    ToggleHelp,
    HideHelp,
    Quit,
}

/// Apply a message to the model.
///
/// Side effects (opening URLs, starting the watcher, reading files) happen in
/// the event loop after `update` returns.
pub fn update(mut model: Model, msg: Message) -> Model {
    let doc = &mut model.document;
    match msg {
        Message::ScrollUp(n) => {
            doc.scroll_up(n);
        }
        Message::ScrollDown(n) => {
            doc.scroll_down(n);
        }
        Message::PageUp => {
            doc.page_up();
        }
        Message::PageDown => {
            doc.page_down();
        }
        Message::HalfPageUp => {
            doc.half_page_up();
        }
        Message::HalfPageDown => {
            doc.half_page_down();
        }
        Message::GoToTop => {
            doc.scroll_to_top();
        }
        Message::GoToBottom => {
            doc.scroll_to_bottom();
        }
        Message::GoToPercent(percent) => {
            doc.scroll_to_percent(percent);
        }
        Message::ScrollLeft(n) => {
            doc.scroll_left(n);
        }
        Message::ScrollRight(n) => {
            doc.scroll_right(n);
        }
        Message::NextHeading => {
            let offset = doc.scroll_position();
            if let Some(idx) = doc.headings().iter().position(|h| h.line > offset) {
                doc.scroll_to_heading(idx);
            }
        }
        Message::PrevHeading => {
            let offset = doc.scroll_position();
            if let Some(idx) = doc.headings().iter().rposition(|h| h.line < offset) {
                doc.scroll_to_heading(idx);
            }
        }
        Message::Resize(width, height) => {
            model.resize(width, height);
        }

        Message::StartSearch => {
            model.search_input = Some(String::new());
        }
        Message::SearchInput(query) => {
            doc.search(&query);
            model.search_input = Some(query);
        }
        Message::SubmitSearch => {
            model.search_input = None;
        }
        Message::NextMatch => {
            doc.next_search_result();
        }
        Message::PrevMatch => {
            doc.previous_search_result();
        }
        Message::ClearSearch => {
            doc.clear_search();
            model.search_input = None;
        }

        Message::FollowLink(idx) => {
            doc.activate_link(idx);
        }
        Message::FollowPreferredLink => {
            if let Some(idx) = model.preferred_link() {
                model.document.activate_link(idx);
            }
        }
        Message::HoverLink(link) => {
            model.hovered_link = link;
        }

        Message::ToggleLineNumbers => {
            let options = doc.options().clone();
            let enabled = !options.line_numbers;
            doc.set_options(options.with_line_numbers(enabled));
        }
        Message::ToggleWrap => {
            let options = doc.options().clone();
            let enabled = !options.word_wrap;
            doc.set_options(options.with_word_wrap(enabled));
        }
        Message::ToggleHighlight => {
            let options = doc.options().clone();
            let enabled = !options.syntax_highlighting;
            doc.set_options(options.with_syntax_highlighting(enabled));
        }

        Message::ToggleWatch => {
            model.watch_enabled = !model.watch_enabled;
        }
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        Message::Quit => {
            model.should_quit = true;
        }
        // Handled as side effects
        Message::FileChanged | Message::ForceReload => {}
    }
    model
}
