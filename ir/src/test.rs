mod support;

mod cse;
mod dispatch;
mod mutate;
mod nodes;
