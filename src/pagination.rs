#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    HasNextPage,
    NoMorePages,
    PageLimitReached,
}

impl PageState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::HasNextPage)
    }
}

/// Drives in-page pagination with a hard page ceiling.
///
/// The first advance reaches page 1 (the initial load), every later one
/// reaches `current + 1`. After `max_pages` successful advances the
/// controller is `PageLimitReached` and never asks to navigate again, even
/// when a next-page control would still be clickable.
#[derive(Debug, Clone)]
pub struct PaginationController {
    max_pages: usize,
    page: usize,
    state: PageState,
}

impl PaginationController {
    pub fn new(max_pages: usize) -> Self {
        let state = if max_pages == 0 {
            PageState::PageLimitReached
        } else {
            PageState::HasNextPage
        };

        Self {
            max_pages,
            page: 0,
            state,
        }
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Page reached by the last successful advance; 0 before the first.
    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Tries to reach the next page through `go_to(target_page)`.
    ///
    /// Returns the page number reached, or `None` once pagination is over.
    pub fn advance<F>(&mut self, go_to: F) -> Option<usize>
    where
        F: FnOnce(usize) -> bool,
    {
        if self.state.is_terminal() {
            return None;
        }

        let target = self.page + 1;
        if !go_to(target) {
            self.state = PageState::NoMorePages;
            return None;
        }

        self.page = target;
        if self.page >= self.max_pages {
            self.state = PageState::PageLimitReached;
        }
        Some(self.page)
    }

    /// Ends pagination early, e.g. when a page never finished loading.
    pub fn stop(&mut self) {
        if !self.state.is_terminal() {
            self.state = PageState::NoMorePages;
        }
    }
}
