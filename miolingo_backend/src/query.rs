use super::*;
use serde::Serialize;

/// A field an entity list may be ordered by.
pub trait OrderField: Sized + Copy {
    fn from_name(name: &str) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering<F> {
    pub field: F,
    pub descending: bool,
}

impl<F: OrderField> Ordering<F> {
    pub fn asc(field: F) -> Self {
        Ordering { field, descending: false }
    }

    pub fn desc(field: F) -> Self {
        Ordering { field, descending: true }
    }

    /// Parses `field` or `-field`; unknown fields yield `None`.
    pub fn parse(directive: &str) -> Option<Self> {
        let directive = directive.trim();
        let (name, descending) = if directive.starts_with('-') {
            (&directive[1..], true)
        } else {
            (directive, false)
        };
        F::from_name(name).map(|field| Ordering { field, descending })
    }

    /// Parses a comma separated list, ignoring unknown fields. Falls back to
    /// `default` when nothing usable is left.
    pub fn parse_list(list: Option<&str>, default: &[Ordering<F>]) -> Vec<Ordering<F>> {
        let parsed: Vec<Ordering<F>> = list.map(|l| l.split(',').filter_map(Self::parse).collect())
            .unwrap_or_else(Vec::new);
        if parsed.is_empty() {
            default.to_vec()
        } else {
            parsed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationOrder {
    Text,
    Priority,
}

impl OrderField for TranslationOrder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(TranslationOrder::Text),
            "priority" => Some(TranslationOrder::Priority),
            _ => None,
        }
    }
}

impl TranslationOrder {
    pub fn default_ordering() -> Vec<Ordering<TranslationOrder>> {
        vec![Ordering::desc(TranslationOrder::Priority)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonOrder {
    Name,
    Priority,
}

impl OrderField for LessonOrder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(LessonOrder::Name),
            "priority" => Some(LessonOrder::Priority),
            _ => None,
        }
    }
}

impl LessonOrder {
    pub fn default_ordering() -> Vec<Ordering<LessonOrder>> {
        vec![Ordering::desc(LessonOrder::Priority), Ordering::asc(LessonOrder::Name)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationFilter {
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonFilter {
    pub is_active: Option<bool>,
}

/// 1-based page number and an already capped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// `page_size` falls back to `default_size` and is capped at `max_size`.
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_size: u32, max_size: u32)
        -> PageRequest
    {
        let page_size = match page_size {
            Some(0) | None => default_size,
            Some(size) => size,
        };
        PageRequest {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.min(max_size).max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn num_pages(&self, count: i64) -> u32 {
        if count <= 0 {
            1
        } else {
            ((count - 1) / self.page_size as i64 + 1) as u32
        }
    }

    /// The first page always exists, even when empty.
    pub fn check(&self, count: i64) -> Result<()> {
        if self.page > self.num_pages(count) {
            return Err(ErrorKind::NotFound("page").into());
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest { page: 1, page_size: 20 }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub count: i64,
    pub page: u32,
    pub num_pages: u32,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, count: i64, results: Vec<T>) -> Page<T> {
        let num_pages = request.num_pages(count);
        Page {
            count,
            page: request.page,
            num_pages,
            next: if request.page < num_pages { Some(request.page + 1) } else { None },
            previous: if request.page > 1 { Some(request.page - 1) } else { None },
            results,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            num_pages: self.num_pages,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordering_directives() {
        assert_eq!(Ordering::parse("-priority"), Some(Ordering::desc(TranslationOrder::Priority)));
        assert_eq!(Ordering::parse(" text"), Some(Ordering::asc(TranslationOrder::Text)));
        assert_eq!(Ordering::<TranslationOrder>::parse("name"), None);
        assert_eq!(Ordering::parse("name"), Some(Ordering::asc(LessonOrder::Name)));
    }

    #[test]
    fn unknown_fields_fall_back_to_default() {
        let default = LessonOrder::default_ordering();
        assert_eq!(Ordering::parse_list(None, &default), default);
        assert_eq!(Ordering::parse_list(Some("created_at,-owner"), &default), default);
        assert_eq!(Ordering::parse_list(Some("name,bogus,-priority"), &default),
                   vec![Ordering::asc(LessonOrder::Name), Ordering::desc(LessonOrder::Priority)]);
    }

    #[test]
    fn page_size_is_capped() {
        assert_eq!(PageRequest::new(None, None, 20, 100), PageRequest { page: 1, page_size: 20 });
        assert_eq!(PageRequest::new(Some(3), Some(500), 20, 100).page_size, 100);
        assert_eq!(PageRequest::new(Some(0), Some(0), 20, 100), PageRequest { page: 1, page_size: 20 });
    }

    #[test]
    fn page_cursors() {
        let req = PageRequest { page: 2, page_size: 10 };
        assert_eq!(req.offset(), 10);
        let page = Page::new(req, 25, vec![1, 2, 3]);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));

        let last = Page::new(PageRequest { page: 3, page_size: 10 }, 25, vec![0]);
        assert_eq!(last.next, None);
    }

    #[test]
    fn pages_past_the_end_are_not_found() {
        assert!(PageRequest { page: 1, page_size: 10 }.check(0).is_ok());
        assert!(PageRequest { page: 3, page_size: 10 }.check(21).is_ok());
        let err = PageRequest { page: 4, page_size: 10 }.check(21).unwrap_err();
        assert!(err.is_not_found());
    }
}
