// SPDX-License-Identifier: MIT
//
// The browser session — one page, one URL, one focus.
//
// `Browser` implements piko-term's `App`. All of its state lives on the
// render thread; the only thing that crosses threads is a finished load,
// picked up in `on_tick`.
//
// Navigation is a request, not an action: `open_link` records the new URL,
// bumps the request generation and sets `loading`. The next tick hands it
// to the loader. When the document comes back for the current generation:
//
//   1. scroll to the top, fresh Lua state
//   2. run the page's `[start]`, then `[redirect]` action
//   3. drop all focus and the URL caret
//   4. focus the first input, unless it says `autofocus="no"`
//
// Actions never mutate the browser while they run. Their `visit()` and
// `action()` calls are queued as effects and applied once the script has
// returned, which keeps the page borrow simple and makes nested actions an
// explicit, depth-limited recursion.
//
// Each frame hashes the inputs of its three regions (URL bar, page, debug
// overlay) and only marks the regions whose hash moved. A panic in event
// handling, a tick or a paint ends up in the debug log, not in a crash.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use piko_page::compose;
use piko_page::document::LinkTarget;
use piko_page::edit::{self, EditKey, EditOutcome};
use piko_page::script::MAX_ACTION_DEPTH;
use piko_page::units::input_lines;
use piko_page::{Document, Evaluator, Focus, ScriptError, ScriptHost, Vec2};
use piko_term::buffer::Rect;
use piko_term::event_loop::{Action, App};
use piko_term::input::Event;
use piko_term::screen::Screen;
use piko_term::terminal::{catch_frame, Size};
use tracing::{debug, info, warn};
use url::Url;

use crate::chrome::{self, DebugLog};
use crate::keymap::{self, Command};
use crate::loader::{Loaded, Loader, PIKO_SCHEME, Source};
use crate::lua::LuaEvaluator;

pub const EXIT_URL: &str = "piko://exit";

const PIKO_ONLY: &str = "Can not open piko:// links. Only Piko can open these links.";

// ─── URLs ────────────────────────────────────────────────────────────────────

/// `target` made absolute against `base`. Absolute targets and anything
/// that can't be joined pass through unchanged.
#[must_use]
pub fn resolve_url(base: &str, target: &str) -> String {
    if [PIKO_SCHEME, "http://", "https://"].iter().any(|s| target.starts_with(s)) {
        return target.to_owned();
    }
    Url::parse(base)
        .and_then(|b| b.join(target))
        .map_or_else(|_| target.to_owned(), String::from)
}

/// The `BROWSER_*` names scripts see for `url`. Parts a URL doesn't have
/// are empty strings.
fn url_names(url: &str) -> Vec<(String, String)> {
    let parsed = Url::parse(url).ok();
    let part = |f: fn(&Url) -> Option<String>| parsed.as_ref().and_then(f).unwrap_or_default();
    [
        ("BROWSER_URL", url.to_owned()),
        ("BROWSER_HOST", part(|u| u.host_str().map(str::to_owned))),
        ("BROWSER_PATH", part(|u| Some(u.path().to_owned()))),
        ("BROWSER_QUERY", part(|u| u.query().map(str::to_owned))),
        ("BROWSER_FRAGMENT", part(|u| u.fragment().map(str::to_owned))),
        ("BROWSER_SCHEME", part(|u| Some(u.scheme().to_owned()))),
        ("BROWSER_USERNAME", part(|u| Some(u.username().to_owned()))),
        ("BROWSER_PASSWORD", part(|u| u.password().map(str::to_owned))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect()
}

fn url_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// ─── Script host ─────────────────────────────────────────────────────────────

/// Something an action asked for, applied after it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    Visit(String),
    Action(String),
}

/// The browser as seen from inside one action.
struct PageHost<'a> {
    document: &'a mut Document,
    vars: &'a mut HashMap<String, String>,
    log: &'a mut DebugLog,
    url: &'a str,
    effects: Vec<Effect>,
}

impl ScriptHost for PageHost<'_> {
    fn visit(&mut self, url: &str) {
        self.effects.push(Effect::Visit(url.to_owned()));
    }

    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_owned(), value.to_owned());
    }

    fn action(&mut self, name: &str) {
        self.effects.push(Effect::Action(name.to_owned()));
    }

    fn debug(&mut self, text: &str) {
        self.log.push(text);
    }

    fn set_value(&mut self, id: &str, value: &str) -> bool {
        self.document.set_value(id, value)
    }

    fn url_param(&self, name: &str) -> Option<String> {
        url_param(self.url, name)
    }
}

// ─── Frames ──────────────────────────────────────────────────────────────────

/// Hashes of what each screen region shows. Equal hashes paint equal
/// regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    url_bar: u64,
    page: u64,
    debug: u64,
}

fn hash_of(value: impl Hash) -> u64 {
    let mut h = DefaultHasher::new();
    value.hash(&mut h);
    h.finish()
}

// ─── Browser ─────────────────────────────────────────────────────────────────

pub struct Browser {
    document: Document,
    url: String,
    loading: bool,
    /// Bumped by every navigation; loads for older values are dropped.
    generation: u64,
    loader: Loader,
    script: LuaEvaluator,
    /// Script variables. They outlive the page.
    vars: HashMap<String, String>,
    log: DebugLog,
    debug_mode: bool,
    debug_height: u16,
    /// URL bar caret, only while the URL bar has focus.
    caret: Option<usize>,
    scroll: i32,
    size: Size,
    last_frame: Option<Frame>,
    quit: bool,
}

impl Browser {
    /// A session that starts loading `url` on the first tick.
    #[must_use]
    pub fn new(url: &str, source: Source, debug_height: u16) -> Self {
        Self {
            document: Document::new(),
            url: url.to_owned(),
            loading: true,
            generation: 1,
            loader: Loader::new(source),
            script: LuaEvaluator::new(),
            vars: HashMap::new(),
            log: DebugLog::new(),
            debug_mode: false,
            debug_height,
            caret: None,
            scroll: 0,
            size: Size::FALLBACK,
            last_frame: None,
            quit: false,
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Follow `target` from the current page.
    pub fn open_link(&mut self, target: &str) {
        if target == EXIT_URL {
            self.quit = true;
            return;
        }
        if target.starts_with(PIKO_SCHEME) && !self.url.starts_with(PIKO_SCHEME) {
            warn!(from = %self.url, to = target, "piko:// link from a web page refused");
            self.document = Document::with_message(PIKO_ONLY);
            return;
        }
        self.url = resolve_url(&self.url, target);
        self.generation += 1;
        self.loading = true;
        info!(url = %self.url, generation = self.generation, "navigate");
    }

    fn start_pending_load(&mut self) {
        if !self.loading || self.loader.is_busy() {
            return;
        }
        if let Err(e) = self.loader.start(&self.url, self.generation) {
            warn!(%e, "cannot start loader");
            let message = format!("Could not load URL. \n{e}");
            self.log.push(&message);
            self.document = Document::with_message(&message);
            self.loading = false;
        }
    }

    fn accept(&mut self, loaded: Loaded) {
        if loaded.generation != self.generation {
            debug!(url = %loaded.url, generation = loaded.generation, "stale load discarded");
            return;
        }
        if let Some(err) = &loaded.error {
            warn!(url = %loaded.url, err = %err, "load failed");
            self.log.push(err);
        }
        info!(url = %loaded.url, "page loaded");
        self.document = loaded.document;
        self.loading = false;
        self.script = LuaEvaluator::new();
        self.scroll = 0;

        self.run_action("[start]", None, 0);
        self.run_action("[redirect]", None, 0);

        self.document.unfocus();
        self.caret = None;
        if self.document.has_inputs && self.document.focus_element(0) {
            let opted_out = self
                .document
                .focused_element()
                .is_some_and(|id| self.document.tree[id].attr("autofocus") == Some("no"));
            if opted_out {
                self.document.unfocus();
            }
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    fn script_names(&self, value: Option<&str>) -> Vec<(String, String)> {
        let mut names = url_names(&self.url);
        if let Some(value) = value {
            names.push(("value".to_owned(), value.to_owned()));
        }
        names
    }

    /// Run the page action `name`, then whatever it asked for.
    fn run_action(&mut self, name: &str, value: Option<&str>, depth: usize) {
        if depth >= MAX_ACTION_DEPTH {
            let err = ScriptError::TooDeep(name.to_owned());
            warn!(%err);
            self.log.push(&err.to_string());
            return;
        }
        let Some(code) = self.document.find_action(name).map(|a| a.code.clone()) else {
            return;
        };
        debug!(action = name, depth, "run action");

        let names = self.script_names(value);
        let mut host = PageHost {
            document: &mut self.document,
            vars: &mut self.vars,
            log: &mut self.log,
            url: &self.url,
            effects: Vec::new(),
        };
        let result = self.script.eval(&code, &names, &mut host);
        let effects = host.effects;

        if let Err(e) = result {
            warn!(action = name, %e, "action failed");
            self.log.push(&format!("{name}: {e}"));
        }
        for effect in effects {
            match effect {
                Effect::Visit(url) => self.open_link(&url),
                Effect::Action(next) => self.run_action(&next, None, depth + 1),
            }
        }
    }

    /// Run the action an input names in `attr` with its current value.
    fn run_input_action(&mut self, attr: &str) {
        let Some(node) = self.document.focused_element() else {
            return;
        };
        let el = &self.document.tree[node];
        let (Some(name), Some(value)) = (el.attr(attr), el.value()) else {
            return;
        };
        let (name, value) = (name.to_owned(), value.to_owned());
        self.run_action(&name, Some(&value), 0);
    }

    fn follow_link(&mut self, key: char) {
        let Some(link) = self.document.find_link(key) else {
            return;
        };
        match link.target.clone() {
            LinkTarget::Url(url) => self.open_link(&url),
            LinkTarget::Submit(action) => self.run_action(&action, None, 0),
        }
    }

    // ── Focus and editing ────────────────────────────────────────────────

    fn sync_caret(&mut self) {
        self.caret = (self.document.focus() == Focus::UrlBar).then(|| self.url.chars().count());
    }

    fn edit_url(&mut self, key: &EditKey) {
        let mut caret = self.caret.unwrap_or_else(|| self.url.chars().count());
        let outcome = edit::apply(&mut self.url, &mut caret, key, false);
        self.caret = Some(caret);
        if outcome == EditOutcome::Submit {
            let target = self.url.clone();
            self.open_link(&target);
            self.document.unfocus();
            self.caret = None;
        }
    }

    fn edit_element(&mut self, key: &EditKey) {
        let Some(node) = self.document.focused_element() else {
            return;
        };
        let multiline = input_lines(&self.document.tree[node]) > 1;
        let Some(state) = self.document.tree[node].input_mut() else {
            return;
        };
        match state.edit(key, multiline) {
            EditOutcome::None => {}
            EditOutcome::Changed => self.run_input_action("change"),
            EditOutcome::Submit => self.run_input_action("submit"),
            EditOutcome::ScrollUp => self.scroll -= 1,
            EditOutcome::ScrollDown => self.scroll += 1,
        }
    }

    fn paste_clipboard(&mut self) {
        match arboard::Clipboard::new().and_then(|mut c| c.get_text()) {
            Ok(text) => self.edit_url(&EditKey::Paste(text)),
            Err(e) => {
                debug!(%e, "clipboard unavailable");
                self.log.push(&format!("Clipboard: {e}"));
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn execute(&mut self, command: Command) {
        match command {
            Command::Quit => self.quit = true,
            Command::ToggleDebug => self.debug_mode = !self.debug_mode,
            Command::FocusNext => {
                self.document.focus_next();
                self.sync_caret();
            }
            Command::FocusUrlBar => {
                self.document.focus_url_bar();
                self.sync_caret();
            }
            Command::Unfocus => {
                self.document.unfocus();
                self.caret = None;
            }
            Command::Scroll(rows) => self.scroll += rows,
            Command::FollowLink(key) => self.follow_link(key),
            Command::PasteClipboard => self.paste_clipboard(),
            Command::Edit(key) => match self.document.focus() {
                Focus::UrlBar => self.edit_url(&key),
                Focus::Element(_) => self.edit_element(&key),
                Focus::Unfocused => {}
            },
        }
    }

    /// Rows the page may show: everything below the URL bar.
    fn viewport(&self) -> Vec2 {
        Vec2::new(i32::from(self.size.cols), i32::from(self.size.rows.saturating_sub(1)))
    }

    fn clamp_scroll(&mut self) {
        let view = self.viewport();
        let max = (self.document.size(view).y - view.y).max(0);
        self.scroll = self.scroll.clamp(0, max);
    }

    // ── Frames ───────────────────────────────────────────────────────────

    fn frame(&self) -> Frame {
        let url_focused = self.document.focus() == Focus::UrlBar;
        Frame {
            url_bar: hash_of((&self.url, self.caret, url_focused, self.loading)),
            page: hash_of((
                &self.document.tree,
                &self.document.background,
                &self.document.foreground,
                self.scroll,
                self.viewport(),
            )),
            debug: hash_of((self.debug_mode, self.debug_mode.then_some(self.log.revision()))),
        }
    }

    /// Rows the debug overlay covers on a `width` × `height` screen.
    fn debug_rect(&self, width: u16, height: u16) -> Rect {
        let rows = self.debug_height.min(height);
        Rect::new(0, i32::from(height - rows), width, rows)
    }

    fn paint_frame(&mut self, screen: &mut Screen, force: bool) {
        let frame = self.frame();
        let last = self.last_frame.replace(frame).filter(|_| !force);
        if last == Some(frame) {
            return;
        }

        let view = self.viewport();
        let focused = self.document.focus() == Focus::UrlBar;
        let buf = screen.back_mut();
        chrome::paint_url_bar(buf, &self.url, self.caret, focused, self.loading);
        compose::render_document(&self.document, view.x, view.y, self.scroll).blit(buf, 1);
        if self.debug_mode {
            chrome::paint_debug(buf, &self.log, self.debug_height);
        }

        let Some(last) = last else {
            screen.mark_all_dirty();
            return;
        };
        let (width, height) = (screen.width(), screen.height());
        if last.url_bar != frame.url_bar {
            screen.mark_dirty(Rect::new(0, 0, width, 1));
        }
        if last.page != frame.page {
            screen.mark_dirty(Rect::new(0, 1, width, height.saturating_sub(1)));
        }
        if last.debug != frame.debug {
            let rect = self.debug_rect(width, height);
            screen.mark_dirty(rect);
        }
    }

    /// Run `f`. If it panics, log the message and carry on.
    fn guarded(&mut self, stage: &str, f: impl FnOnce(&mut Self)) {
        if let Err(msg) = catch_frame(|| f(self)) {
            warn!(stage, %msg, "frame failed");
            self.log.push(&format!("{stage} failed: {msg}"));
        }
    }
}

// ─── App ─────────────────────────────────────────────────────────────────────

impl App for Browser {
    fn on_event(&mut self, event: &Event) -> Action {
        self.guarded("event", |b| {
            if let Some(command) = keymap::command(b.document.focus(), event) {
                b.execute(command);
            }
            b.clamp_scroll();
        });
        if self.quit { Action::Quit } else { Action::Continue }
    }

    fn on_resize(&mut self, size: Size) {
        self.size = size;
        self.guarded("resize", Self::clamp_scroll);
    }

    fn on_tick(&mut self) -> Action {
        self.guarded("tick", |b| {
            if let Some(loaded) = b.loader.poll() {
                b.accept(loaded);
            }
            b.start_pending_load();
            b.clamp_scroll();
        });
        if self.quit { Action::Quit } else { Action::Continue }
    }

    fn paint(&mut self, screen: &mut Screen, force: bool) {
        self.guarded("paint", |b| b.paint_frame(screen, force));
        // A failed paint logged a line; take that into the frame so the
        // same failure isn't retried every tick.
        if self.last_frame.is_some() {
            self.last_frame = Some(self.frame());
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use piko_term::input::{KeyCode, KeyEvent, Modifiers};
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn page(body: &str) -> String {
        format!(r#"<piko type="m100_xml">{body}</piko>"#)
    }

    /// A browser over a pages directory holding `pages`, opened on
    /// `piko://home` and settled.
    fn browser(pages: &[(&str, &str)]) -> (TempDir, Browser) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in pages {
            fs::write(dir.path().join(format!("{name}.xml")), page(body)).unwrap();
        }
        let source = Source {
            pages_dir: Some(dir.path().to_path_buf()),
            user_agent: "Piko".into(),
        };
        let mut b = Browser::new("piko://home", source, 8);
        b.on_resize(Size { cols: 40, rows: 12 });
        settle(&mut b);
        (dir, b)
    }

    /// Tick until nothing is loading.
    fn settle(b: &mut Browser) {
        let deadline = Instant::now() + Duration::from_secs(5);
        b.on_tick();
        while b.loading || b.loader.is_busy() {
            assert!(Instant::now() < deadline, "page did not load");
            thread::sleep(Duration::from_millis(2));
            b.on_tick();
        }
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::plain(code))
    }

    fn alt(ch: char) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(ch),
            modifiers: Modifiers::ALT,
        })
    }

    fn type_str(b: &mut Browser, text: &str) {
        for ch in text.chars() {
            b.on_event(&press(KeyCode::Char(ch)));
        }
    }

    fn log_lines(b: &Browser) -> Vec<&str> {
        b.log.lines().skip(1).collect()
    }

    fn first_text(b: &Browser) -> String {
        let root = b.document.tree.roots()[0];
        b.document.tree[root].value().unwrap_or_default().to_owned()
    }

    #[test]
    fn resolves_relative_urls() {
        assert_eq!(resolve_url("https://example.com/a/b", "c"), "https://example.com/a/c");
        assert_eq!(resolve_url("https://example.com/a/", "/x?y=1"), "https://example.com/x?y=1");
        assert_eq!(resolve_url("https://example.com/", "piko://help"), "piko://help");
        assert_eq!(resolve_url("nonsense", "page"), "page");
    }

    #[test]
    fn script_names_describe_the_url() {
        let names = url_names("https://ada:pw@example.com/p?q=1#f");
        let get = |k: &str| names.iter().find(|(n, _)| n == k).map(|(_, v)| v.as_str());
        assert_eq!(get("BROWSER_HOST"), Some("example.com"));
        assert_eq!(get("BROWSER_PATH"), Some("/p"));
        assert_eq!(get("BROWSER_QUERY"), Some("q=1"));
        assert_eq!(get("BROWSER_FRAGMENT"), Some("f"));
        assert_eq!(get("BROWSER_SCHEME"), Some("https"));
        assert_eq!(get("BROWSER_USERNAME"), Some("ada"));
        assert_eq!(get("BROWSER_PASSWORD"), Some("pw"));
        assert_eq!(url_param("piko://x?a=1&b=two%20words", "b").as_deref(), Some("two words"));
    }

    #[test]
    fn start_and_redirect_run_in_order() {
        let (_dir, b) = browser(&[(
            "home",
            r#"<action name="[redirect]">debug("second")</action>
               <action name="[start]">debug("first " .. BROWSER_SCHEME)</action>
               <text>hi</text>"#,
        )]);
        assert!(!b.loading);
        assert_eq!(log_lines(&b), vec!["first piko", "second"]);
        assert_eq!(first_text(&b), "hi");
    }

    #[test]
    fn first_input_takes_focus_unless_opted_out() {
        let (_dir, b) = browser(&[("home", r#"<text>x</text><input id="a"/><input id="b"/>"#)]);
        assert_eq!(b.document.focus(), Focus::Element(0));

        let (_dir, b) = browser(&[("home", r#"<input id="a" autofocus="no"/>"#)]);
        assert_eq!(b.document.focus(), Focus::Unfocused);
    }

    #[test]
    fn submit_runs_action_and_navigates() {
        let (_dir, mut b) = browser(&[
            (
                "home",
                r#"<action name="go">visit("piko://next?q=" .. encode(value))</action>
                   <input id="q" submit="go"/>"#,
            ),
            ("next", r#"<action name="[start]">debug("q=" .. geturlparam("q"))</action>"#),
        ]);
        type_str(&mut b, "a b");
        b.on_event(&press(KeyCode::Enter));
        assert_eq!(b.url, "piko://next?q=a%20b");
        assert!(b.loading);
        settle(&mut b);
        assert_eq!(log_lines(&b), vec!["q=a b"]);
    }

    #[test]
    fn change_action_sees_every_edit() {
        let (_dir, mut b) = browser(&[(
            "home",
            r#"<action name="seen">debug(value)</action><input change="seen"/>"#,
        )]);
        type_str(&mut b, "ab");
        b.on_event(&press(KeyCode::Backspace));
        b.on_event(&press(KeyCode::Left));
        assert_eq!(log_lines(&b), vec!["a", "ab", "a"]);
    }

    #[test]
    fn escape_toggles_the_url_bar() {
        let (_dir, mut b) = browser(&[("home", "<text>x</text>")]);
        b.on_event(&press(KeyCode::Escape));
        assert_eq!(b.document.focus(), Focus::UrlBar);
        assert_eq!(b.caret, Some("piko://home".len()));
        b.on_event(&press(KeyCode::Escape));
        assert_eq!(b.document.focus(), Focus::Unfocused);
        assert_eq!(b.caret, None);
    }

    #[test]
    fn tab_without_inputs_stays_on_url_bar() {
        let (_dir, mut b) = browser(&[("home", "<text>x</text>")]);
        b.on_event(&press(KeyCode::Escape));
        b.on_event(&press(KeyCode::Tab));
        assert_eq!(b.document.focus(), Focus::UrlBar);
    }

    #[test]
    fn url_bar_edit_and_enter_navigates() {
        let (_dir, mut b) = browser(&[("home", "<text>home</text>"), ("other", "<text>other</text>")]);
        b.on_event(&press(KeyCode::Escape));
        for _ in 0.."home".len() {
            b.on_event(&press(KeyCode::Backspace));
        }
        type_str(&mut b, "other");
        assert_eq!(b.url, "piko://other");
        b.on_event(&press(KeyCode::Enter));
        assert_eq!(b.document.focus(), Focus::Unfocused);
        assert_eq!(b.caret, None);
        settle(&mut b);
        assert_eq!(first_text(&b), "other");
    }

    #[test]
    fn links_navigate_run_actions_and_exit() {
        let (_dir, mut b) = browser(&[
            (
                "home",
                r#"<action name="hello">debug("hello")</action>
                   <link key="1" url="piko://other">Other</link>
                   <link key="2" submit="hello">Hello</link>
                   <link key="0" url="piko://exit">Exit</link>"#,
            ),
            ("other", "<text>other</text>"),
        ]);
        assert_eq!(b.on_event(&press(KeyCode::Char('2'))), Action::Continue);
        assert_eq!(log_lines(&b), vec!["hello"]);
        assert_eq!(b.on_event(&press(KeyCode::Char('0'))), Action::Quit);
    }

    #[test]
    fn backtick_quits_only_when_unfocused() {
        let (_dir, mut b) = browser(&[("home", "<input/>")]);
        assert_eq!(b.on_event(&press(KeyCode::Char('`'))), Action::Continue);
        b.on_event(&alt('q'));
        assert_eq!(b.on_event(&press(KeyCode::Char('`'))), Action::Quit);
    }

    #[test]
    fn web_pages_cannot_open_piko_links() {
        let (_dir, mut b) = browser(&[("home", "<text>x</text>")]);
        b.url = "https://example.com/".into();
        b.open_link("piko://home");
        assert!(!b.loading);
        assert_eq!(b.url, "https://example.com/");
        assert_eq!(first_text(&b), PIKO_ONLY);
    }

    #[test]
    fn stale_loads_are_dropped() {
        let (_dir, mut b) = browser(&[("home", "<text>home</text>"), ("other", "<text>other</text>")]);
        b.open_link("piko://home");
        b.on_tick();
        assert!(b.loader.is_busy());
        b.open_link("piko://other");
        settle(&mut b);
        assert_eq!(b.url, "piko://other");
        assert_eq!(first_text(&b), "other");
    }

    #[test]
    fn runaway_actions_are_cut_off() {
        let (_dir, mut b) = browser(&[(
            "home",
            r#"<action name="loop">action("loop")</action><link key="1" submit="loop">x</link>"#,
        )]);
        b.on_event(&press(KeyCode::Char('1')));
        assert_eq!(log_lines(&b), vec!["action `loop` nested too deep"]);
    }

    #[test]
    fn script_errors_go_to_the_debug_log() {
        let (_dir, b) = browser(&[("home", r#"<action name="[start]">error("bad")</action>"#)]);
        let lines = log_lines(&b);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[start]: script error:"), "{}", lines[0]);
    }

    #[test]
    fn variables_survive_navigation_and_setvalue_writes() {
        let (_dir, mut b) = browser(&[
            (
                "home",
                r#"<action name="[start]">var("who", "ada") visit("piko://other")</action>"#,
            ),
            (
                "other",
                r#"<action name="[start]">setvalue("out", getvar("who"))</action><text id="out">?</text>"#,
            ),
        ]);
        settle(&mut b);
        assert_eq!(first_text(&b), "ada");
        assert_eq!(log_lines(&b), vec!["who: ada"]);
    }

    #[test]
    fn scroll_is_clamped_to_the_page() {
        let lines = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("&#10;");
        let body = format!(r#"<text preserve="true">{lines}</text>"#);
        let (_dir, mut b) = browser(&[("home", &body)]);
        for _ in 0..30 {
            b.on_event(&press(KeyCode::Down));
        }
        assert_eq!(b.scroll, 20 - 11);
        b.on_event(&press(KeyCode::Up));
        assert_eq!(b.scroll, 8);
    }

    #[test]
    fn paint_draws_chrome_and_skips_unchanged_frames() {
        let (_dir, mut b) = browser(&[("home", "<text>hello</text>")]);
        let mut screen = Screen::new(40, 12);
        b.paint(&mut screen, true);
        assert!(screen.back().row_text(0).starts_with("piko://home "));
        assert!(screen.back().row_text(0).ends_with('✔'));
        assert!(screen.back().row_text(1).starts_with("hello"));
        screen.present();

        b.paint(&mut screen, false);
        assert!(screen.dirty_regions().is_empty());

        b.on_event(&alt('k'));
        b.paint(&mut screen, false);
        assert!(!screen.dirty_regions().is_empty());
        assert!(screen.back().row_text(4).starts_with("Debugger"));
        assert_eq!(screen.dirty_regions(), &[Rect::new(0, 4, 40, 8)]);
    }

    #[test]
    fn url_bar_typing_repaints_only_the_url_row() {
        let (_dir, mut b) = browser(&[("home", "<text>hello</text>")]);
        let mut screen = Screen::new(40, 12);
        b.on_event(&press(KeyCode::Escape));
        b.paint(&mut screen, true);
        screen.present();

        b.on_event(&press(KeyCode::Char('x')));
        b.paint(&mut screen, false);
        assert_eq!(screen.dirty_regions(), &[Rect::new(0, 0, 40, 1)]);
        assert!(screen.back().row_text(0).starts_with("piko://homex"));
        screen.present();

        b.on_event(&press(KeyCode::Escape));
        b.on_event(&press(KeyCode::Char('x')));
        b.paint(&mut screen, false);
        assert!(screen.dirty_regions().iter().all(|r| r.y == 0));
    }

    #[test]
    fn page_changes_repaint_the_viewport() {
        let (_dir, mut b) = browser(&[(
            "home",
            r#"<action name="hi">setvalue("out", "changed")</action>
               <text id="out">before</text><link key="1" submit="hi">x</link>"#,
        )]);
        let mut screen = Screen::new(40, 12);
        b.paint(&mut screen, true);
        screen.present();

        b.on_event(&press(KeyCode::Char('1')));
        b.paint(&mut screen, false);
        assert_eq!(screen.dirty_regions(), &[Rect::new(0, 1, 40, 11)]);
        assert!(screen.back().row_text(1).starts_with("changed"));
    }

    #[test]
    fn panics_inside_a_frame_are_logged() {
        let (_dir, mut b) = browser(&[("home", "<text>x</text>")]);
        b.guarded("tick", |_| panic!("boom"));
        assert_eq!(log_lines(&b), vec!["tick failed: boom"]);
        assert_eq!(b.on_tick(), Action::Continue);

        let mut screen = Screen::new(40, 12);
        b.guarded("paint", |_| panic!("bad paint"));
        b.paint(&mut screen, true);
        assert!(screen.back().row_text(1).starts_with('x'));
    }

    #[test]
    fn hostile_sizes_still_paint_and_scroll() {
        let (_dir, mut b) = browser(&[(
            "home",
            r#"<container padding="2147483647"><text>x</text></container>
               <input lines="2147483647" width="2147483647" autofocus="no"/>"#,
        )]);
        let mut screen = Screen::new(40, 12);
        b.paint(&mut screen, true);
        for _ in 0..3 {
            b.on_event(&press(KeyCode::Down));
        }
        b.paint(&mut screen, false);
        assert_eq!(b.scroll, 3);
        assert!(log_lines(&b).is_empty(), "{:?}", log_lines(&b));
    }
}
