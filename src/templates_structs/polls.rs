use askama::Template;

use crate::presentation::{DetailContext, IndexContext, ResultsContext};
use super::PageContext;

#[derive(Template)]
#[template(path = "polls/index.html")]
pub struct IndexTemplate {
    pub ctx: PageContext,
    pub view: IndexContext,
}

#[derive(Template)]
#[template(path = "polls/detail.html")]
pub struct DetailTemplate {
    pub ctx: PageContext,
    pub view: DetailContext,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "polls/results.html")]
pub struct ResultsTemplate {
    pub ctx: PageContext,
    pub view: ResultsContext,
}
