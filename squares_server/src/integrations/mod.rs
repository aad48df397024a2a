pub mod score_feed;
