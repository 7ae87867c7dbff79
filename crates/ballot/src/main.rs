use ballot::Ballot;
use ballot_util_error::WhateverResult;

#[tokio::main]
#[snafu::report]
async fn main() -> WhateverResult<()> {
    Ballot::builder().run().await
}
