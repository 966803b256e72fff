mod dispatch;
mod helper;
mod initialize;
