mod test_websocket_end_to_end;
