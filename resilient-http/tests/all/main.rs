mod helpers;
mod logging;
